use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

/// Stream properties reported by a frame source when it is opened.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    /// 0.0 when the container does not report a frame rate.
    pub fps: f64,
    /// 0 when the container does not report a frame count.
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    pub fn duration_seconds(&self) -> f64 {
        if self.fps > 0.0 {
            self.total_frames as f64 / self.fps
        } else {
            0.0
        }
    }
}

/// Filesystem timestamps of the source file, as Unix seconds.
///
/// Each field is `None` when the platform or filesystem does not track it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SourceFileTimes {
    pub created: Option<u64>,
    pub modified: Option<u64>,
    pub accessed: Option<u64>,
}

impl SourceFileTimes {
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let meta = std::fs::metadata(path)?;
        Ok(Self {
            created: meta.created().ok().and_then(unix_seconds),
            modified: meta.modified().ok().and_then(unix_seconds),
            accessed: meta.accessed().ok().and_then(unix_seconds),
        })
    }
}

fn unix_seconds(t: SystemTime) -> Option<u64> {
    t.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn meta(fps: f64, total_frames: usize) -> VideoMetadata {
        VideoMetadata {
            width: 1920,
            height: 1080,
            fps,
            total_frames,
            codec: "h264".to_string(),
            source_path: Some(PathBuf::from("/tmp/test.mp4")),
        }
    }

    #[test]
    fn test_duration_seconds() {
        assert_relative_eq!(meta(30.0, 900).duration_seconds(), 30.0);
    }

    #[test]
    fn test_duration_unknown_fps_is_zero() {
        assert_relative_eq!(meta(0.0, 900).duration_seconds(), 0.0);
    }

    #[test]
    fn test_source_file_times_reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"x").unwrap();

        let times = SourceFileTimes::read(&path).unwrap();
        assert!(times.modified.is_some());
    }

    #[test]
    fn test_source_file_times_missing_file_errors() {
        assert!(SourceFileTimes::read(Path::new("/nonexistent/clip.mp4")).is_err());
    }
}
