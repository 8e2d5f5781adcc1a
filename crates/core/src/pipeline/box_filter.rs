use crate::shared::bounding_box::BoundingBox;

use super::triage_config::FaceSize;

/// Drops detections smaller than the minimum face size.
///
/// A box is kept only when both its width and height reach the minimum.
#[derive(Clone, Copy, Debug)]
pub struct BoxFilter {
    min_width: i32,
    min_height: i32,
}

impl BoxFilter {
    pub fn new(min_size: FaceSize) -> Self {
        Self {
            min_width: i32::try_from(min_size.width).unwrap_or(i32::MAX),
            min_height: i32::try_from(min_size.height).unwrap_or(i32::MAX),
        }
    }

    pub fn accepts(&self, bbox: &BoundingBox) -> bool {
        bbox.width() >= self.min_width && bbox.height() >= self.min_height
    }

    pub fn apply(&self, boxes: Vec<BoundingBox>) -> Vec<BoundingBox> {
        boxes.into_iter().filter(|b| self.accepts(b)).collect()
    }
}
