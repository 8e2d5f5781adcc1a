use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::Parser;

use facetriage_core::detection::domain::face_detector::FaceDetector;
use facetriage_core::detection::infrastructure::onnx_yolo_detector::{
    OnnxYoloDetector, DEFAULT_CONFIDENCE,
};
use facetriage_core::pipeline::infrastructure::annotated_frame_writer::AnnotatedFrameWriter;
use facetriage_core::pipeline::infrastructure::threaded_pipeline_executor::ThreadedPipelineExecutor;
use facetriage_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use facetriage_core::pipeline::triage_config::{FaceSize, TriageConfig};
use facetriage_core::pipeline::triage_event::{EventCallback, TriageEvent};
use facetriage_core::pipeline::triage_video_use_case::{TriageOutcome, TriageVideoUseCase};
use facetriage_core::recognition::domain::face_embedder::FaceEmbedder;
use facetriage_core::recognition::domain::gallery::Gallery;
use facetriage_core::recognition::domain::gallery_loader::GalleryLoader;
use facetriage_core::recognition::domain::identity_matcher::DistanceMetric;
use facetriage_core::recognition::infrastructure::image_directory_gallery_loader::ImageDirectoryGalleryLoader;
use facetriage_core::recognition::infrastructure::json_gallery_loader::JsonGalleryLoader;
use facetriage_core::recognition::infrastructure::onnx_face_embedder::OnnxFaceEmbedder;
use facetriage_core::report::domain::metadata_sink::MetadataSink;
use facetriage_core::report::infrastructure::json_metadata_sink::JsonMetadataSink;
use facetriage_core::report::infrastructure::multi_metadata_sink::MultiMetadataSink;
use facetriage_core::report::infrastructure::text_report_sink::TextReportSink;
use facetriage_core::shared::constants::{FACE_DETECTOR_MODEL, FACE_EMBEDDING_MODEL};
use facetriage_core::shared::model_resolver::{self, ModelSpec};
use facetriage_core::shared::timestamp::format_timestamp;
use facetriage_core::video::domain::artifact_sink::ArtifactSink;
use facetriage_core::video::infrastructure::ffmpeg_frame_source::FfmpegFrameSource;
use facetriage_core::video::infrastructure::image_file_artifact_sink::ImageFileArtifactSink;

/// Catalog the unique faces in a video and flag known people.
#[derive(Parser, Debug)]
#[command(name = "facetriage", version)]
struct Cli {
    /// Input video file.
    input: PathBuf,

    /// Directory for face crops and the metadata report.
    #[arg(short, long, default_value = "faces")]
    output: PathBuf,

    /// Directory of reference photos, one known person per file.
    #[arg(long, conflicts_with = "gallery_json")]
    known_faces: Option<PathBuf>,

    /// JSON file of precomputed identities: [{"name", "embedding"}].
    #[arg(long)]
    gallery_json: Option<PathBuf>,

    /// JSON file with triage settings; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Analyze every Nth frame.
    #[arg(long)]
    sample_stride: Option<usize>,

    /// Overlap ratio above which boxes in one frame are merged (0-1].
    #[arg(long)]
    nms_threshold: Option<f64>,

    /// Position/size tolerance for treating a face as already seen (0-1].
    #[arg(long)]
    uniqueness_threshold: Option<f64>,

    /// Largest embedding distance that still counts as a match.
    #[arg(long)]
    match_threshold: Option<f64>,

    /// Ignore faces narrower or shorter than this many pixels.
    #[arg(long)]
    min_face_size: Option<u32>,

    /// Embedding distance: cosine or euclidean.
    #[arg(long)]
    metric: Option<DistanceMetric>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    confidence: f64,

    /// Directory searched for model files before downloading.
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Only write the metadata report, not face crops.
    #[arg(long)]
    no_crops: bool,

    /// Also save every analyzed frame with frame number, time and face
    /// boxes drawn on it, under `<output>/<video>_frames/`.
    #[arg(long)]
    annotated_frames: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;
    let config = build_config(&cli)?;

    let detector_model = resolve_model(&FACE_DETECTOR_MODEL, cli.models_dir.as_deref())?;
    let detector = build_detector(&detector_model, cli.confidence)?;

    let wants_gallery = cli.known_faces.is_some() || cli.gallery_json.is_some();
    let embedder: Option<Arc<OnnxFaceEmbedder>> = if wants_gallery {
        let model = resolve_model(&FACE_EMBEDDING_MODEL, cli.models_dir.as_deref())?;
        Some(Arc::new(OnnxFaceEmbedder::new(&model)?))
    } else {
        None
    };
    let gallery = load_gallery(&cli, &detector_model, embedder.as_ref())?;

    let crops = ImageFileArtifactSink::for_video(&cli.output, &cli.input);
    let stem = crops.video_stem().to_string();
    let artifact_sink: Option<Box<dyn ArtifactSink>> = if cli.no_crops {
        None
    } else {
        Some(Box::new(crops))
    };
    let json_path = cli.output.join(format!("{stem}_metadata.json"));
    let text_path = cli.output.join(format!("{stem}_metadata.txt"));
    let metadata_sink: Box<dyn MetadataSink> = Box::new(MultiMetadataSink::new(vec![
        Box::new(JsonMetadataSink::new(&json_path)),
        Box::new(TextReportSink::new(&text_path)),
    ]));
    let annotator = cli
        .annotated_frames
        .then(|| AnnotatedFrameWriter::new(cli.output.join(format!("{stem}_frames"))));

    let mut use_case = TriageVideoUseCase::new(
        config,
        Box::new(FfmpegFrameSource::new()),
        detector,
        embedder.map(|e| Box::new(e) as Box<dyn FaceEmbedder>),
        gallery,
        artifact_sink,
        Some(metadata_sink),
        Box::new(ThreadedPipelineExecutor::new()),
        None,
        Some(on_event(annotator)),
        None,
    )?
    .with_logger(Box::new(StdoutPipelineLogger::default()));

    let outcome = use_case.execute(&cli.input)?;
    print_outcome(&outcome, &json_path, &text_path);
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.is_file() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    Ok(())
}

/// Config file (or defaults) with command-line overrides applied.
fn build_config(cli: &Cli) -> Result<TriageConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => TriageConfig::from_json_file(path)?,
        None => TriageConfig::default(),
    };
    if let Some(stride) = cli.sample_stride {
        config.sample_stride = stride;
    }
    if let Some(t) = cli.nms_threshold {
        config.nms_overlap_threshold = t;
    }
    if let Some(t) = cli.uniqueness_threshold {
        config.uniqueness_threshold = t;
    }
    if let Some(t) = cli.match_threshold {
        config.match_threshold = t;
    }
    if let Some(side) = cli.min_face_size {
        config.min_face_size = FaceSize {
            width: side,
            height: side,
        };
    }
    if let Some(metric) = cli.metric {
        config.distance_metric = metric;
    }
    config.validate()?;
    Ok(config)
}

fn resolve_model(
    model: &ModelSpec,
    models_dir: Option<&Path>,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {}", model.name);
    let name = model.name;
    let path = model_resolver::resolve(
        model,
        models_dir,
        Some(Box::new(move |done, total| download_progress(name, done, total))),
    )?;
    Ok(path)
}

fn build_detector(
    model_path: &Path,
    confidence: f64,
) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    Ok(Box::new(OnnxYoloDetector::new(model_path, confidence)?))
}

fn load_gallery(
    cli: &Cli,
    detector_model: &Path,
    embedder: Option<&Arc<OnnxFaceEmbedder>>,
) -> Result<Gallery, Box<dyn std::error::Error>> {
    let loader: Box<dyn GalleryLoader> = match (&cli.known_faces, &cli.gallery_json, embedder) {
        (Some(dir), _, Some(embedder)) => Box::new(ImageDirectoryGalleryLoader::new(
            dir,
            build_detector(detector_model, cli.confidence)?,
            Box::new(Arc::clone(embedder)),
        )),
        (_, Some(path), _) => Box::new(JsonGalleryLoader::new(path)),
        _ => return Ok(Gallery::new()),
    };

    let gallery = loader.load()?;
    if gallery.is_empty() {
        log::warn!("Known-faces gallery is empty; every face will be reported as unknown");
    } else {
        log::info!("Loaded {} known identities", gallery.len());
    }
    Ok(gallery)
}

/// Logs an alert for every identified face and, when enabled, saves the
/// annotated frame.
fn on_event(annotator: Option<AnnotatedFrameWriter>) -> EventCallback {
    Box::new(move |event: &TriageEvent| {
        if let TriageEvent::IdentityMatched(record) = event {
            log::warn!(
                "ALERT: {} identified at {} (frame {}, confidence {:.2})",
                record.name,
                format_timestamp(record.timestamp_seconds),
                record.frame_index,
                record.confidence.unwrap_or_default()
            );
        }
        if let Some(annotator) = &annotator {
            annotator.on_event(event);
        }
    })
}

fn print_outcome(outcome: &TriageOutcome, json_path: &Path, text_path: &Path) {
    if outcome.summary.cancelled {
        println!("Stopped early; partial results below.");
    }
    println!(
        "Found {} unique faces ({} identified) in {} analyzed frames",
        outcome.retained.len(),
        outcome.identified_count(),
        outcome.summary.frames_analyzed
    );
    if outcome.summary.frame_errors > 0 {
        println!("Skipped {} undecodable frames", outcome.summary.frame_errors);
    }
    for record in outcome.records.iter().filter(|r| r.is_identified()) {
        println!(
            "  {} at {} (frame {})",
            record.name,
            format_timestamp(record.timestamp_seconds),
            record.frame_index
        );
    }
    println!("Metadata: {}", json_path.display());
    println!("Report:   {}", text_path.display());
}

fn download_progress(name: &str, downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading {name}... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading {name}... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::parse_from([
            "facetriage",
            "clip.mp4",
            "--sample-stride",
            "10",
            "--min-face-size",
            "32",
            "--metric",
            "euclidean",
        ]);

        let config = build_config(&cli).unwrap();

        assert_eq!(config.sample_stride, 10);
        assert_eq!(
            config.min_face_size,
            FaceSize {
                width: 32,
                height: 32
            }
        );
        assert_eq!(config.distance_metric, DistanceMetric::Euclidean);
        assert_eq!(config.uniqueness_threshold, 0.3);
    }

    #[test]
    fn test_out_of_range_override_rejected() {
        let cli = Cli::parse_from(["facetriage", "clip.mp4", "--nms-threshold", "1.5"]);
        assert!(build_config(&cli).is_err());
    }

    #[test]
    fn test_gallery_sources_conflict() {
        let result = Cli::try_parse_from([
            "facetriage",
            "clip.mp4",
            "--known-faces",
            "people",
            "--gallery-json",
            "people.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_annotated_frames_flag_is_opt_in() {
        let plain = Cli::parse_from(["facetriage", "clip.mp4"]);
        assert!(!plain.annotated_frames);

        let annotated = Cli::parse_from(["facetriage", "clip.mp4", "--annotated-frames"]);
        assert!(annotated.annotated_frames);
    }
}
