pub mod box_filter;
pub mod detection_stage;
pub mod face_cataloger;
pub mod frame_sampler;
pub mod infrastructure;
pub mod pipeline_executor;
pub mod pipeline_logger;
pub mod triage_config;
pub mod triage_error;
pub mod triage_event;
pub mod triage_video_use_case;
