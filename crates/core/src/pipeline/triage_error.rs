use std::path::PathBuf;

use thiserror::Error;

use super::triage_config::ConfigError;

/// Fatal outcomes of a triage run.
///
/// Per-frame and per-face faults (detector errors, failed embeddings,
/// unsaved crops) are recovered inside the pipeline and never surface here.
#[derive(Error, Debug)]
pub enum TriageError {
    #[error("input {path} is unavailable: {reason}")]
    InputUnavailable { path: PathBuf, reason: String },
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("pipeline failed: {0}")]
    Pipeline(String),
    #[error("failed to write metadata: {0}")]
    Sink(String),
    #[error("triage use case already executed")]
    AlreadyExecuted,
}
