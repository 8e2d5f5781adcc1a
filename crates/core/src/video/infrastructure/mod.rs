pub mod ffmpeg_frame_source;
pub mod image_file_artifact_sink;
