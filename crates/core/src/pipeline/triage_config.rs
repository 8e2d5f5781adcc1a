use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detection::domain::non_max_suppressor::DEFAULT_OVERLAP_THRESHOLD;
use crate::detection::domain::unique_face_tracker::DEFAULT_UNIQUENESS_THRESHOLD;
use crate::recognition::domain::identity_matcher::{DistanceMetric, DEFAULT_MATCH_THRESHOLD};

pub const DEFAULT_SAMPLE_STRIDE: usize = 5;
pub const DEFAULT_MIN_FACE_SIZE: u32 = 50;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("sample stride must be at least 1")]
    ZeroStride,
    #[error("NMS overlap threshold must be in (0, 1], got {0}")]
    OverlapThreshold(f64),
    #[error("uniqueness threshold must be in (0, 1], got {0}")]
    UniquenessThreshold(f64),
    #[error("match threshold must be a finite value >= 0, got {0}")]
    MatchThreshold(f64),
    #[error("minimum face size must be positive, got {width}x{height}")]
    MinFaceSize { width: u32, height: u32 },
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Smallest face box, in pixels, that enters the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceSize {
    pub width: u32,
    pub height: u32,
}

impl Default for FaceSize {
    fn default() -> Self {
        Self {
            width: DEFAULT_MIN_FACE_SIZE,
            height: DEFAULT_MIN_FACE_SIZE,
        }
    }
}

/// Tuning knobs for one triage run.
///
/// Every field has a default, so a JSON file only needs the keys it
/// changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    /// Analyze every Nth frame.
    pub sample_stride: usize,
    pub nms_overlap_threshold: f64,
    pub uniqueness_threshold: f64,
    /// Inclusive upper bound on embedding distance for a match.
    pub match_threshold: f64,
    pub min_face_size: FaceSize,
    pub distance_metric: DistanceMetric,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            sample_stride: DEFAULT_SAMPLE_STRIDE,
            nms_overlap_threshold: DEFAULT_OVERLAP_THRESHOLD,
            uniqueness_threshold: DEFAULT_UNIQUENESS_THRESHOLD,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            min_face_size: FaceSize::default(),
            distance_metric: DistanceMetric::default(),
        }
    }
}

impl TriageConfig {
    /// Reads and validates a JSON config file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = |v: f64| v > 0.0 && v <= 1.0;

        if self.sample_stride == 0 {
            return Err(ConfigError::ZeroStride);
        }
        if !unit(self.nms_overlap_threshold) {
            return Err(ConfigError::OverlapThreshold(self.nms_overlap_threshold));
        }
        if !unit(self.uniqueness_threshold) {
            return Err(ConfigError::UniquenessThreshold(self.uniqueness_threshold));
        }
        if !(self.match_threshold.is_finite() && self.match_threshold >= 0.0) {
            return Err(ConfigError::MatchThreshold(self.match_threshold));
        }
        let FaceSize { width, height } = self.min_face_size;
        if width == 0 || height == 0 {
            return Err(ConfigError::MinFaceSize { width, height });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = TriageConfig::default();
        assert_eq!(config.sample_stride, 5);
        assert_eq!(config.nms_overlap_threshold, 0.5);
        assert_eq!(config.uniqueness_threshold, 0.3);
        assert_eq!(config.match_threshold, 0.6);
        assert_eq!(config.min_face_size, FaceSize { width: 50, height: 50 });
        assert_eq!(config.distance_metric, DistanceMetric::Cosine);
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case::zero_stride(TriageConfig { sample_stride: 0, ..Default::default() })]
    #[case::zero_overlap(TriageConfig { nms_overlap_threshold: 0.0, ..Default::default() })]
    #[case::overlap_above_one(TriageConfig { nms_overlap_threshold: 1.5, ..Default::default() })]
    #[case::nan_overlap(TriageConfig { nms_overlap_threshold: f64::NAN, ..Default::default() })]
    #[case::zero_uniqueness(TriageConfig { uniqueness_threshold: 0.0, ..Default::default() })]
    #[case::uniqueness_above_one(TriageConfig { uniqueness_threshold: 1.01, ..Default::default() })]
    #[case::negative_match(TriageConfig { match_threshold: -0.1, ..Default::default() })]
    #[case::infinite_match(TriageConfig { match_threshold: f64::INFINITY, ..Default::default() })]
    #[case::zero_face_width(TriageConfig { min_face_size: FaceSize { width: 0, height: 50 }, ..Default::default() })]
    #[case::zero_face_height(TriageConfig { min_face_size: FaceSize { width: 50, height: 0 }, ..Default::default() })]
    fn test_validate_rejects(#[case] config: TriageConfig) {
        assert!(config.validate().is_err());
    }

    #[rstest]
    #[case::overlap_one(TriageConfig { nms_overlap_threshold: 1.0, ..Default::default() })]
    #[case::match_zero(TriageConfig { match_threshold: 0.0, ..Default::default() })]
    #[case::stride_one(TriageConfig { sample_stride: 1, ..Default::default() })]
    fn test_validate_accepts_boundaries(#[case] config: TriageConfig) {
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_file_fills_missing_keys_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("triage.json");
        std::fs::write(
            &path,
            r#"{"sample_stride": 10, "distance_metric": "euclidean"}"#,
        )
        .unwrap();

        let config = TriageConfig::from_json_file(&path).unwrap();
        assert_eq!(config.sample_stride, 10);
        assert_eq!(config.distance_metric, DistanceMetric::Euclidean);
        assert_eq!(config.match_threshold, 0.6);
    }

    #[test]
    fn test_from_json_file_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("triage.json");
        std::fs::write(&path, r#"{"uniqueness_threshold": 2.0}"#).unwrap();

        assert!(matches!(
            TriageConfig::from_json_file(&path),
            Err(ConfigError::UniquenessThreshold(_))
        ));
    }

    #[test]
    fn test_from_json_file_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("triage.json");
        std::fs::write(&path, "sample_stride = 3").unwrap();

        assert!(matches!(
            TriageConfig::from_json_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_from_json_file_missing() {
        assert!(matches!(
            TriageConfig::from_json_file(Path::new("/nonexistent/triage.json")),
            Err(ConfigError::Read { .. })
        ));
    }
}
