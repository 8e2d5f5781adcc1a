pub mod metadata_record;
pub mod metadata_recorder;
pub mod metadata_sink;
