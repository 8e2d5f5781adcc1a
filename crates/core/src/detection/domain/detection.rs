use serde::Serialize;

use crate::shared::bounding_box::BoundingBox;

/// One face observation in one analyzed frame, after suppression.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub frame_index: usize,
    pub timestamp_seconds: f64,
}
