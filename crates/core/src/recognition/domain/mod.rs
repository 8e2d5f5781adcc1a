pub mod face_embedder;
pub mod gallery;
pub mod gallery_loader;
pub mod identity_matcher;
