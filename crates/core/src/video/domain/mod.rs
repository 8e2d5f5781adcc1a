pub mod artifact_sink;
pub mod frame_source;
