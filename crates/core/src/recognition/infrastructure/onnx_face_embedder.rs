use std::path::Path;
use std::sync::Mutex;

use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::Array4;

use crate::detection::infrastructure::execution_provider::build_session;
use crate::detection::infrastructure::math::l2_normalize;
use crate::recognition::domain::face_embedder::FaceEmbedder;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// ArcFace input side, in pixels.
const ARCFACE_SIDE: u32 = 112;

/// Crops smaller than this on either side carry too little detail to embed.
pub const MIN_CROP_SIDE: u32 = 16;

/// ArcFace-style embedder (InsightFace `w600k_r50`) run through ONNX Runtime.
///
/// The face crop is resized to 112x112 and the output vector is returned
/// with unit length.
pub struct OnnxFaceEmbedder {
    session: Mutex<ort::session::Session>,
}

impl OnnxFaceEmbedder {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            session: Mutex::new(build_session(model_path)?),
        })
    }

    fn infer(&self, crop: &Frame) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
        let input = ort::value::Tensor::from_array(arcface_input(crop)?)?;
        let mut session = self
            .session
            .lock()
            .map_err(|_| "embedding session lock poisoned")?;
        let outputs = session.run(ort::inputs![input])?;
        if outputs.len() == 0 {
            return Err("embedding model returned no outputs".into());
        }
        let vector = outputs[0].try_extract_array::<f32>()?;
        Ok(vector.iter().copied().collect())
    }
}

impl FaceEmbedder for OnnxFaceEmbedder {
    fn embed(
        &self,
        frame: &Frame,
        bbox: &BoundingBox,
    ) -> Result<Option<Vec<f32>>, Box<dyn std::error::Error>> {
        let Some(crop) = frame.crop(bbox) else {
            return Ok(None);
        };
        if crop.width() < MIN_CROP_SIDE || crop.height() < MIN_CROP_SIDE {
            log::debug!("Skipping embedding for {bbox}: crop too small");
            return Ok(None);
        }

        let mut embedding = self.infer(&crop)?;
        if embedding.is_empty() || !l2_normalize(&mut embedding) {
            log::debug!("Embedding for {bbox} is degenerate");
            return Ok(None);
        }
        Ok(Some(embedding))
    }
}

/// Bilinear resize to 112x112, then `(v - 127.5) / 127.5` in NCHW order.
fn arcface_input(crop: &Frame) -> Result<Array4<f32>, Box<dyn std::error::Error>> {
    if crop.channels() != 3 {
        return Err(format!("embedding input must be RGB, got {} channels", crop.channels()).into());
    }
    let rgb = RgbImage::from_raw(crop.width(), crop.height(), crop.data().to_vec())
        .ok_or("crop buffer does not match its dimensions")?;
    let resized = imageops::resize(&rgb, ARCFACE_SIDE, ARCFACE_SIDE, FilterType::Triangle);

    let side = ARCFACE_SIDE as usize;
    Ok(Array4::from_shape_fn((1, 3, side, side), |(_, c, y, x)| {
        (f32::from(resized.get_pixel(x as u32, y as u32)[c]) - 127.5) / 127.5
    }))
}
