use crate::shared::model_resolver::ModelSpec;

pub const FACE_DETECTOR_MODEL: ModelSpec = ModelSpec {
    name: "yolo11n-pose_widerface.onnx",
    url: "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx",
};

pub const FACE_EMBEDDING_MODEL: ModelSpec = ModelSpec {
    name: "w600k_r50.onnx",
    url: "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/w600k_r50.onnx",
};

/// Label written for faces that did not match any gallery identity.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Reference photo extensions accepted by the gallery directory loader.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

/// Cache folder name under the platform cache directory.
pub const APP_CACHE_DIR: &str = "Face Triage";
