use std::fmt::Write as _;
use std::path::PathBuf;

use crate::report::domain::metadata_record::MetadataRecord;
use crate::report::domain::metadata_sink::MetadataSink;
use crate::shared::timestamp::format_timestamp;
use crate::shared::video_metadata::VideoMetadata;

use super::json_metadata_sink::source_file_times;

/// Human-readable report: a video metadata block, then one line per face.
pub struct TextReportSink {
    path: PathBuf,
}

impl TextReportSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MetadataSink for TextReportSink {
    fn write(
        &mut self,
        metadata: &VideoMetadata,
        records: &[MetadataRecord],
    ) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, render(metadata, records)?)?;
        log::info!("Wrote report to {}", self.path.display());
        Ok(())
    }
}

fn render(
    metadata: &VideoMetadata,
    records: &[MetadataRecord],
) -> Result<String, std::fmt::Error> {
    let times = source_file_times(metadata);
    let unix = |t: Option<u64>| t.map_or_else(|| "unknown".to_string(), |s| format!("{s} (unix)"));

    let mut out = String::new();
    if let Some(path) = &metadata.source_path {
        writeln!(out, "Video: {}", path.display())?;
    }
    writeln!(out, "Resolution: {}x{}", metadata.width, metadata.height)?;
    writeln!(out, "Frame Rate: {:.2} fps", metadata.fps)?;
    writeln!(out, "Total Frames: {}", metadata.total_frames)?;
    writeln!(out, "Duration: {:.2} seconds", metadata.duration_seconds())?;
    writeln!(out, "Codec: {}", metadata.codec)?;
    writeln!(out, "Date Created: {}", unix(times.created))?;
    writeln!(out, "Date Modified: {}", unix(times.modified))?;
    writeln!(out, "Date Accessed: {}", unix(times.accessed))?;
    writeln!(out)?;
    writeln!(out, "Faces: {}", records.len())?;

    for r in records {
        write!(
            out,
            "Face {}: Frame {} ({}) Position {} Name: {}",
            r.saved_index,
            r.frame_index,
            format_timestamp(r.timestamp_seconds),
            r.bbox,
            r.name
        )?;
        if let Some(confidence) = r.confidence {
            write!(out, " Confidence: {confidence:.2}")?;
        }
        if let Some(artifact) = &r.artifact_ref {
            write!(out, " File: {artifact}")?;
        }
        writeln!(out)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::bounding_box::BoundingBox;

    fn metadata() -> VideoMetadata {
        VideoMetadata {
            width: 1280,
            height: 720,
            fps: 30.0,
            total_frames: 300,
            codec: "mpeg4".to_string(),
            source_path: Some(PathBuf::from("/videos/lobby.mp4")),
        }
    }

    #[test]
    fn test_render_header_and_face_lines() {
        let records = vec![
            MetadataRecord {
                frame_index: 0,
                timestamp_seconds: 0.0,
                saved_index: 0,
                bbox: BoundingBox::new(100, 100, 60, 60).unwrap(),
                name: "Unknown".to_string(),
                confidence: None,
                artifact_ref: None,
            },
            MetadataRecord {
                frame_index: 150,
                timestamp_seconds: 5.0,
                saved_index: 1,
                bbox: BoundingBox::new(400, 300, 60, 60).unwrap(),
                name: "alice".to_string(),
                confidence: Some(0.8),
                artifact_ref: Some("lobby_face_0001.jpg".to_string()),
            },
        ];

        let text = render(&metadata(), &records).unwrap();

        assert!(text.contains("Resolution: 1280x720"));
        assert!(text.contains("Frame Rate: 30.00 fps"));
        assert!(text.contains("Duration: 10.00 seconds"));
        assert!(text.contains("Date Created: unknown"));
        assert!(text.contains("Faces: 2"));
        assert!(text.contains("Face 0: Frame 0 (0:00) Position (x=100, y=100, w=60, h=60) Name: Unknown\n"));
        assert!(text.contains(
            "Face 1: Frame 150 (0:05) Position (x=400, y=300, w=60, h=60) Name: alice Confidence: 0.80 File: lobby_face_0001.jpg"
        ));
    }

    #[test]
    fn test_write_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lobby_metadata.txt");
        TextReportSink::new(&path).write(&metadata(), &[]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Video: /videos/lobby.mp4"));
        assert!(text.contains("Faces: 0"));
    }
}
