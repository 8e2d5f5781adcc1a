use std::path::PathBuf;

use serde::Serialize;

use crate::report::domain::metadata_record::MetadataRecord;
use crate::report::domain::metadata_sink::MetadataSink;
use crate::shared::timestamp::format_timestamp;
use crate::shared::video_metadata::{SourceFileTimes, VideoMetadata};

/// Writes the catalog as pretty-printed JSON:
/// `{"video": {...}, "faces": [...]}`.
pub struct JsonMetadataSink {
    path: PathBuf,
}

impl JsonMetadataSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[derive(Serialize)]
struct Catalog<'a> {
    video: VideoSection<'a>,
    faces: Vec<FaceEntry<'a>>,
}

#[derive(Serialize)]
struct VideoSection<'a> {
    #[serde(flatten)]
    metadata: &'a VideoMetadata,
    duration_seconds: f64,
    file_times: SourceFileTimes,
}

#[derive(Serialize)]
struct FaceEntry<'a> {
    #[serde(flatten)]
    record: &'a MetadataRecord,
    timestamp: String,
}

impl MetadataSink for JsonMetadataSink {
    fn write(
        &mut self,
        metadata: &VideoMetadata,
        records: &[MetadataRecord],
    ) -> Result<(), Box<dyn std::error::Error>> {
        let catalog = Catalog {
            video: VideoSection {
                metadata,
                duration_seconds: metadata.duration_seconds(),
                file_times: source_file_times(metadata),
            },
            faces: records
                .iter()
                .map(|record| FaceEntry {
                    record,
                    timestamp: format_timestamp(record.timestamp_seconds),
                })
                .collect(),
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&catalog)?;
        std::fs::write(&self.path, json)?;
        log::info!("Wrote {} record(s) to {}", records.len(), self.path.display());
        Ok(())
    }
}

pub(crate) fn source_file_times(metadata: &VideoMetadata) -> SourceFileTimes {
    let Some(path) = metadata.source_path.as_deref() else {
        return SourceFileTimes::default();
    };
    SourceFileTimes::read(path).unwrap_or_else(|e| {
        log::debug!("No file times for {}: {e}", path.display());
        SourceFileTimes::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::bounding_box::BoundingBox;

    fn metadata() -> VideoMetadata {
        VideoMetadata {
            width: 640,
            height: 480,
            fps: 25.0,
            total_frames: 250,
            codec: "h264".to_string(),
            source_path: None,
        }
    }

    fn record(saved_index: usize, name: &str, confidence: Option<f64>) -> MetadataRecord {
        MetadataRecord {
            frame_index: 75,
            timestamp_seconds: 3.0,
            saved_index,
            bbox: BoundingBox::new(10, 20, 60, 70).unwrap(),
            name: name.to_string(),
            confidence,
            artifact_ref: Some(format!("clip_face_{saved_index:04}.jpg")),
        }
    }

    fn write_and_parse(records: &[MetadataRecord]) -> serde_json::Value {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("metadata.json");
        JsonMetadataSink::new(&path)
            .write(&metadata(), records)
            .unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn test_writes_video_section() {
        let json = write_and_parse(&[]);
        let video = &json["video"];
        assert_eq!(video["width"], 640);
        assert_eq!(video["codec"], "h264");
        assert_eq!(video["duration_seconds"], 10.0);
        assert!(json["faces"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_writes_one_entry_per_record() {
        let json = write_and_parse(&[
            record(0, "Unknown", None),
            record(1, "alice", Some(0.75)),
        ]);
        let faces = json["faces"].as_array().unwrap();
        assert_eq!(faces.len(), 2);

        assert_eq!(faces[0]["name"], "Unknown");
        assert!(faces[0]["confidence"].is_null());
        assert_eq!(faces[1]["name"], "alice");
        assert_eq!(faces[1]["confidence"], 0.75);
        assert_eq!(faces[1]["saved_index"], 1);
        assert_eq!(faces[1]["timestamp"], "0:03");
        assert_eq!(faces[1]["bbox"]["width"], 60);
        assert_eq!(faces[1]["artifact_ref"], "clip_face_0001.jpg");
    }

    #[test]
    fn test_includes_file_times_of_existing_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("clip.mp4");
        std::fs::write(&source, b"x").unwrap();
        let mut meta = metadata();
        meta.source_path = Some(source);

        assert!(source_file_times(&meta).modified.is_some());
    }

    #[test]
    fn test_unwritable_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"file").unwrap();

        let mut sink = JsonMetadataSink::new(blocker.join("metadata.json"));
        assert!(sink.write(&metadata(), &[]).is_err());
    }
}
