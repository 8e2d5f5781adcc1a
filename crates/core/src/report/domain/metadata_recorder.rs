use super::metadata_record::MetadataRecord;

/// Append-only, in-memory sequence of catalog records for one run.
#[derive(Debug, Default)]
pub struct MetadataRecorder {
    records: Vec<MetadataRecord>,
}

impl MetadataRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: MetadataRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[MetadataRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<MetadataRecord> {
        self.records
    }
}
