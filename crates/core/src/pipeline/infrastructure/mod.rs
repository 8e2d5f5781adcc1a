pub mod annotated_frame_writer;
pub mod threaded_pipeline_executor;
