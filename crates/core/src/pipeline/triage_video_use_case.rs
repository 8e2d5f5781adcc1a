use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::non_max_suppressor::NonMaxSuppressor;
use crate::detection::domain::unique_face_tracker::{RetainedFace, UniqueFaceTracker};
use crate::recognition::domain::face_embedder::FaceEmbedder;
use crate::recognition::domain::gallery::Gallery;
use crate::recognition::domain::identity_matcher::IdentityMatcher;
use crate::report::domain::metadata_record::MetadataRecord;
use crate::report::domain::metadata_sink::MetadataSink;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::artifact_sink::ArtifactSink;
use crate::video::domain::frame_source::FrameSource;

use super::box_filter::BoxFilter;
use super::detection_stage::DetectionStage;
use super::face_cataloger::FaceCataloger;
use super::frame_sampler::FrameSampler;
use super::pipeline_executor::{ExecutionSummary, PipelineConfig, PipelineExecutor, ProgressCallback};
use super::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use super::triage_config::TriageConfig;
use super::triage_error::TriageError;
use super::triage_event::EventCallback;

/// Everything one run produced.
#[derive(Clone, Debug)]
pub struct TriageOutcome {
    pub metadata: VideoMetadata,
    pub retained: Vec<RetainedFace>,
    pub records: Vec<MetadataRecord>,
    pub summary: ExecutionSummary,
}

impl TriageOutcome {
    pub fn identified_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_identified()).count()
    }
}

/// Catalogs the unique faces of one video.
///
/// Single-use: `execute` consumes the owned adapters, so a second call
/// returns [`TriageError::AlreadyExecuted`].
pub struct TriageVideoUseCase {
    config: TriageConfig,
    source: Option<Box<dyn FrameSource>>,
    detector: Option<Box<dyn FaceDetector>>,
    embedder: Option<Box<dyn FaceEmbedder>>,
    gallery: Option<Gallery>,
    artifact_sink: Option<Box<dyn ArtifactSink>>,
    metadata_sink: Option<Box<dyn MetadataSink>>,
    executor: Box<dyn PipelineExecutor>,
    logger: Box<dyn PipelineLogger>,
    on_progress: Option<ProgressCallback>,
    on_event: Option<EventCallback>,
    cancelled: Arc<AtomicBool>,
}

impl TriageVideoUseCase {
    /// Fails with [`TriageError::InvalidConfig`] before anything is opened.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: TriageConfig,
        source: Box<dyn FrameSource>,
        detector: Box<dyn FaceDetector>,
        embedder: Option<Box<dyn FaceEmbedder>>,
        gallery: Gallery,
        artifact_sink: Option<Box<dyn ArtifactSink>>,
        metadata_sink: Option<Box<dyn MetadataSink>>,
        executor: Box<dyn PipelineExecutor>,
        on_progress: Option<ProgressCallback>,
        on_event: Option<EventCallback>,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Result<Self, TriageError> {
        config.validate()?;
        Ok(Self {
            config,
            source: Some(source),
            detector: Some(detector),
            embedder,
            gallery: Some(gallery),
            artifact_sink,
            metadata_sink,
            executor,
            logger: Box::new(NullPipelineLogger),
            on_progress,
            on_event,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        })
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn execute(&mut self, input: &Path) -> Result<TriageOutcome, TriageError> {
        let mut source = self.source.take().ok_or(TriageError::AlreadyExecuted)?;
        let detector = self.detector.take().ok_or(TriageError::AlreadyExecuted)?;
        let gallery = self.gallery.take().ok_or(TriageError::AlreadyExecuted)?;

        let metadata = match source.open(input) {
            Ok(metadata) => metadata,
            Err(e) => {
                source.close();
                return Err(TriageError::InputUnavailable {
                    path: input.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        };
        self.logger.info(&format!(
            "Triaging {}: {}x{} at {:.2} fps, {} frames, gallery of {}",
            input.display(),
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.total_frames,
            gallery.len()
        ));

        let config = &self.config;
        let stage = DetectionStage::new(
            detector,
            BoxFilter::new(config.min_face_size),
            NonMaxSuppressor::new(config.nms_overlap_threshold),
        );
        let mut cataloger = FaceCataloger::new(
            UniqueFaceTracker::new(config.uniqueness_threshold),
            IdentityMatcher::new(config.match_threshold, config.distance_metric),
            gallery,
            self.embedder.take(),
            self.artifact_sink.take(),
            self.on_event.take(),
        );
        let sampler = FrameSampler::new(config.sample_stride, metadata.fps);
        let pipeline_config = PipelineConfig {
            on_progress: self.on_progress.take(),
            cancelled: self.cancelled.clone(),
        };

        let summary = self
            .executor
            .execute(
                source,
                stage,
                &mut cataloger,
                sampler,
                metadata.total_frames,
                pipeline_config,
                self.logger.as_mut(),
            )
            .map_err(|e| TriageError::Pipeline(e.to_string()))?;

        let (retained, records) = cataloger.finish();

        if let Some(mut sink) = self.metadata_sink.take() {
            sink.write(&metadata, &records)
                .map_err(|e| TriageError::Sink(e.to_string()))?;
        }

        let outcome = TriageOutcome {
            metadata,
            retained,
            records,
            summary,
        };
        log::info!(
            "Retained {} unique faces ({} identified) from {} analyzed frames",
            outcome.retained.len(),
            outcome.identified_count(),
            outcome.summary.frames_analyzed
        );
        self.logger.summary();
        Ok(outcome)
    }
}
