use std::sync::Arc;

use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Domain interface for computing an identity embedding of one face.
///
/// `Ok(None)` means the region holds no usable face (too small, blank, or
/// rejected by the model). Callers treat both `None` and `Err` as "cannot
/// identify" and keep going.
pub trait FaceEmbedder: Send {
    fn embed(
        &self,
        frame: &Frame,
        bbox: &BoundingBox,
    ) -> Result<Option<Vec<f32>>, Box<dyn std::error::Error>>;
}

/// Lets one loaded model serve both gallery building and the pipeline.
impl<T: FaceEmbedder + Sync + ?Sized> FaceEmbedder for Arc<T> {
    fn embed(
        &self,
        frame: &Frame,
        bbox: &BoundingBox,
    ) -> Result<Option<Vec<f32>>, Box<dyn std::error::Error>> {
        (**self).embed(frame, bbox)
    }
}
