use serde::Serialize;

use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::UNKNOWN_NAME;

/// Catalog entry for one retained face.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetadataRecord {
    pub frame_index: usize,
    pub timestamp_seconds: f64,
    pub saved_index: usize,
    pub bbox: BoundingBox,
    /// Matched identity, or `"Unknown"`.
    pub name: String,
    pub confidence: Option<f64>,
    /// Whatever the artifact sink returned; `None` when saving failed or no
    /// sink was configured.
    pub artifact_ref: Option<String>,
}

impl MetadataRecord {
    pub fn is_identified(&self) -> bool {
        self.confidence.is_some() && self.name != UNKNOWN_NAME
    }
}
