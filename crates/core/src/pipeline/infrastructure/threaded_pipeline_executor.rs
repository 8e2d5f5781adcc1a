use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};

use crate::detection::domain::detection::Detection;
use crate::pipeline::detection_stage::DetectionStage;
use crate::pipeline::face_cataloger::FaceCataloger;
use crate::pipeline::frame_sampler::FrameSampler;
use crate::pipeline::pipeline_executor::{ExecutionSummary, PipelineConfig, PipelineExecutor};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::frame::Frame;
use crate::video::domain::frame_source::FrameSource;

const DEFAULT_CHANNEL_CAPACITY: usize = 8;

struct SampledFrame {
    frame: Frame,
    timestamp_seconds: f64,
}

struct DetectedFrame {
    frame: Frame,
    timestamp_seconds: f64,
    detections: Vec<Detection>,
    detect_ms: f64,
}

#[derive(Default)]
struct ReadStats {
    frames_read: usize,
    frame_errors: usize,
}

/// Runs decoding and detection on dedicated threads.
///
/// Layout: `reader [sample] → detector [detect/filter/NMS] → caller [catalog]`
///
/// Both queues are bounded FIFO channels with a single consumer each, so
/// the cataloger receives analyzed frames in source order.
pub struct ThreadedPipelineExecutor {
    channel_capacity: usize,
}

impl ThreadedPipelineExecutor {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(channel_capacity: usize) -> Self {
        Self {
            channel_capacity: channel_capacity.max(1),
        }
    }
}

impl Default for ThreadedPipelineExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineExecutor for ThreadedPipelineExecutor {
    fn execute(
        &self,
        source: Box<dyn FrameSource>,
        stage: DetectionStage,
        cataloger: &mut FaceCataloger,
        sampler: FrameSampler,
        total_frames: usize,
        config: PipelineConfig,
        logger: &mut dyn PipelineLogger,
    ) -> Result<ExecutionSummary, Box<dyn std::error::Error>> {
        let cap = self.channel_capacity;
        let (sampled_tx, sampled_rx) = crossbeam_channel::bounded::<SampledFrame>(cap);
        let (detected_tx, detected_rx) = crossbeam_channel::bounded::<DetectedFrame>(cap);

        let reader_handle = spawn_reader(source, sampler, sampled_tx, config.cancelled.clone());
        let detect_handle = spawn_detector(stage, sampled_rx, detected_tx, config.cancelled.clone());

        let expected = sampler.analyzed_count(total_frames);
        let frames_analyzed = run_main_loop(detected_rx, cataloger, expected, &config, logger);

        let stats = join_threads(reader_handle, detect_handle)?;

        let summary = ExecutionSummary {
            frames_read: stats.frames_read,
            frames_analyzed,
            frame_errors: stats.frame_errors,
            cancelled: config.cancelled.load(Ordering::Relaxed),
        };
        if summary.cancelled {
            logger.info(&format!(
                "Cancelled after {} analyzed frames",
                summary.frames_analyzed
            ));
        }
        Ok(summary)
    }
}

fn spawn_reader(
    mut source: Box<dyn FrameSource>,
    sampler: FrameSampler,
    sampled_tx: Sender<SampledFrame>,
    cancelled: Arc<AtomicBool>,
) -> JoinHandle<(Box<dyn FrameSource>, ReadStats)> {
    std::thread::spawn(move || {
        let mut stats = ReadStats::default();
        for frame_result in source.frames() {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            let frame = match frame_result {
                Ok(frame) => frame,
                Err(e) => {
                    stats.frame_errors += 1;
                    log::warn!("Skipping undecodable frame: {e}");
                    continue;
                }
            };
            stats.frames_read += 1;

            let index = frame.index();
            if !sampler.should_analyze(index) {
                continue;
            }
            let sampled = SampledFrame {
                frame,
                timestamp_seconds: sampler.timestamp_seconds(index),
            };
            if sampled_tx.send(sampled).is_err() {
                break;
            }
        }
        (source, stats)
    })
}

fn spawn_detector(
    mut stage: DetectionStage,
    sampled_rx: Receiver<SampledFrame>,
    detected_tx: Sender<DetectedFrame>,
    cancelled: Arc<AtomicBool>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for sampled in sampled_rx {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            let started = Instant::now();
            let detections = stage.run(&sampled.frame, sampled.timestamp_seconds);
            let detected = DetectedFrame {
                frame: sampled.frame,
                timestamp_seconds: sampled.timestamp_seconds,
                detections,
                detect_ms: started.elapsed().as_secs_f64() * 1000.0,
            };
            if detected_tx.send(detected).is_err() {
                break;
            }
        }
    })
}

/// Catalogs detected frames in arrival order. Returns the number of frames
/// handed to the cataloger.
fn run_main_loop(
    detected_rx: Receiver<DetectedFrame>,
    cataloger: &mut FaceCataloger,
    expected: usize,
    config: &PipelineConfig,
    logger: &mut dyn PipelineLogger,
) -> usize {
    let mut analyzed = 0;

    while let Ok(detected) = detected_rx.recv() {
        if config.cancelled.load(Ordering::Relaxed) {
            break;
        }
        logger.metric("detect_queue_depth", detected_rx.len() as f64);
        logger.timing("detect", detected.detect_ms);
        logger.metric("faces_per_frame", detected.detections.len() as f64);

        let started = Instant::now();
        cataloger.catalog(
            Arc::new(detected.frame),
            detected.timestamp_seconds,
            detected.detections,
        );
        logger.timing("catalog", started.elapsed().as_secs_f64() * 1000.0);

        analyzed += 1;
        // Container frame counts are estimates; never report past 100%.
        let total = expected.max(analyzed);
        logger.progress(analyzed, total);
        if let Some(callback) = &config.on_progress {
            if !callback(analyzed, total) {
                config.cancelled.store(true, Ordering::Relaxed);
                break;
            }
        }
    }

    analyzed
}

/// Joins both worker threads and closes the source.
fn join_threads(
    reader_handle: JoinHandle<(Box<dyn FrameSource>, ReadStats)>,
    detect_handle: JoinHandle<()>,
) -> Result<ReadStats, Box<dyn std::error::Error>> {
    let detect_result = detect_handle.join();
    let (mut source, stats) = reader_handle
        .join()
        .map_err(|_| "Reader thread panicked")?;
    source.close();

    if detect_result.is_err() {
        return Err("Detect thread panicked".into());
    }
    Ok(stats)
}
