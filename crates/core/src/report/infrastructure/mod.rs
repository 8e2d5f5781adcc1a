pub mod json_metadata_sink;
pub mod multi_metadata_sink;
pub mod text_report_sink;
