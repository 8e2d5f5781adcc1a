use super::gallery::{Gallery, GalleryError};

/// Source of reference identities, loaded once before a run.
pub trait GalleryLoader {
    fn load(&self) -> Result<Gallery, GalleryError>;
}
