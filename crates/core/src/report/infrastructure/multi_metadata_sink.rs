use crate::report::domain::metadata_record::MetadataRecord;
use crate::report::domain::metadata_sink::MetadataSink;
use crate::shared::video_metadata::VideoMetadata;

/// Fans one catalog out to several sinks in order.
///
/// Every sink is attempted; the first error is returned after all have run.
pub struct MultiMetadataSink {
    sinks: Vec<Box<dyn MetadataSink>>,
}

impl MultiMetadataSink {
    pub fn new(sinks: Vec<Box<dyn MetadataSink>>) -> Self {
        Self { sinks }
    }
}

impl MetadataSink for MultiMetadataSink {
    fn write(
        &mut self,
        metadata: &VideoMetadata,
        records: &[MetadataRecord],
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut first_error = None;
        for sink in &mut self.sinks {
            if let Err(e) = sink.write(metadata, records) {
                log::warn!("Metadata sink failed: {e}");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
