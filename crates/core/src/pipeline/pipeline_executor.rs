use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::video::domain::frame_source::FrameSource;

use super::detection_stage::DetectionStage;
use super::face_cataloger::FaceCataloger;
use super::frame_sampler::FrameSampler;
use super::pipeline_logger::PipelineLogger;

pub type ProgressCallback = Box<dyn Fn(usize, usize) -> bool + Send>;

/// Run-time controls for one execution.
pub struct PipelineConfig {
    /// Called with `(analyzed, expected_analyzed)` after each analyzed
    /// frame. Returning `false` cancels the run.
    pub on_progress: Option<ProgressCallback>,
    pub cancelled: Arc<AtomicBool>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            on_progress: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecutionSummary {
    /// Frames decoded, analyzed or not.
    pub frames_read: usize,
    pub frames_analyzed: usize,
    /// Decode errors that were skipped.
    pub frame_errors: usize,
    pub cancelled: bool,
}

/// Drives frames from an opened source through detection and into the
/// cataloger.
///
/// Implementations must hand frames to the cataloger in source order.
/// Cancellation is not an error: the run stops early and the summary is
/// marked cancelled.
pub trait PipelineExecutor: Send {
    #[allow(clippy::too_many_arguments)]
    fn execute(
        &self,
        source: Box<dyn FrameSource>,
        stage: DetectionStage,
        cataloger: &mut FaceCataloger,
        sampler: FrameSampler,
        total_frames: usize,
        config: PipelineConfig,
        logger: &mut dyn PipelineLogger,
    ) -> Result<ExecutionSummary, Box<dyn std::error::Error>>;
}
