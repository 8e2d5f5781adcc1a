pub mod image_directory_gallery_loader;
pub mod json_gallery_loader;
pub mod onnx_face_embedder;
