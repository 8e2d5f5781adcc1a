use crate::detection::domain::unique_face_tracker::RetainedFace;
use crate::shared::frame::Frame;

/// Persists the pixel crop of a retained face.
///
/// Returns an opaque reference (a path, an object id) that is copied into
/// the face's metadata record and never interpreted by the pipeline.
pub trait ArtifactSink: Send {
    fn save(
        &mut self,
        crop: &Frame,
        face: &RetainedFace,
    ) -> Result<String, Box<dyn std::error::Error>>;
}
