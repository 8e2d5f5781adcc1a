use crate::shared::video_metadata::VideoMetadata;

use super::metadata_record::MetadataRecord;

/// Persists the finished catalog of one video.
pub trait MetadataSink: Send {
    fn write(
        &mut self,
        metadata: &VideoMetadata,
        records: &[MetadataRecord],
    ) -> Result<(), Box<dyn std::error::Error>>;
}
