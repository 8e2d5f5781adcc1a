use std::path::Path;

use ndarray::Array4;

use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

use super::execution_provider::build_session;
use super::math::{corner_iou, Corners};

/// Used when the model input shape is dynamic.
const DEFAULT_INPUT_SIZE: u32 = 640;

pub const DEFAULT_CONFIDENCE: f64 = 0.25;

/// IoU above which two anchors are taken to be the same face.
const ANCHOR_IOU_THRESH: f64 = 0.45;

/// YOLO letterbox padding value.
const PAD_VALUE: f32 = 114.0 / 255.0;

/// YOLO face model (plain or pose variant) run through ONNX Runtime.
///
/// Returns boxes in frame pixels, clipped to the frame. Anchors that fired
/// on the same face are collapsed here by IoU; overlap suppression across
/// distinct detections is left to the pipeline.
pub struct OnnxYoloDetector {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Reads the square input size from the model's NCHW input shape.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = build_session(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| match input.dtype() {
                ort::value::ValueType::Tensor { shape, .. } if shape.len() == 4 => {
                    u32::try_from(shape[2]).ok().filter(|&side| side > 0)
                }
                _ => None,
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);
        log::debug!("YOLO detector: input {input_size}px, confidence {confidence}");

        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }
}

impl FaceDetector for OnnxYoloDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
        let letterbox = Letterbox::fit(frame, self.input_size)?;

        let input = ort::value::Tensor::from_array(letterbox.tensor.clone())?;
        let outputs = self.session.run(ort::inputs![input])?;
        if outputs.len() == 0 {
            return Err("YOLO model returned no outputs".into());
        }
        let output = outputs[0].try_extract_array::<f32>()?;
        let shape = output.shape().to_vec();
        let data = output
            .as_slice()
            .ok_or("YOLO output tensor is not contiguous")?;

        let candidates = decode_anchors(data, &shape, self.confidence)?;
        let boxes = collapse_anchors(candidates, ANCHOR_IOU_THRESH)
            .into_iter()
            .filter_map(|anchor| {
                let [x1, y1, x2, y2] = letterbox.to_frame(anchor.corners);
                BoundingBox::from_corners(x1, y1, x2, y2)
            })
            .filter_map(|bbox| bbox.clamp_to(frame.width(), frame.height()))
            .collect();
        Ok(boxes)
    }
}

/// A frame scaled to fit the model's square input with gray bars.
struct Letterbox {
    tensor: Array4<f32>,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl Letterbox {
    /// Nearest-neighbour resize of an RGB frame into a `side`×`side` NCHW
    /// tensor scaled to `[0, 1]`.
    fn fit(frame: &Frame, side: u32) -> Result<Self, Box<dyn std::error::Error>> {
        if frame.width() == 0 || frame.height() == 0 || frame.channels() < 3 {
            return Err(format!(
                "cannot letterbox a {}x{}x{} frame",
                frame.width(),
                frame.height(),
                frame.channels()
            )
            .into());
        }
        let pixels = frame
            .as_ndarray()
            .ok_or("frame buffer does not match its dimensions")?;

        let (src_w, src_h) = (frame.width() as usize, frame.height() as usize);
        let scale = (f64::from(side) / src_w as f64).min(f64::from(side) / src_h as f64);
        let fit_w = ((src_w as f64 * scale).round() as usize).min(side as usize);
        let fit_h = ((src_h as f64 * scale).round() as usize).min(side as usize);
        let left = (side as usize - fit_w) / 2;
        let top = (side as usize - fit_h) / 2;

        let mut tensor = Array4::from_elem((1, 3, side as usize, side as usize), PAD_VALUE);
        for y in 0..fit_h {
            let sy = ((y as f64 / scale) as usize).min(src_h - 1);
            for x in 0..fit_w {
                let sx = ((x as f64 / scale) as usize).min(src_w - 1);
                for c in 0..3 {
                    tensor[[0, c, top + y, left + x]] = f32::from(pixels[[sy, sx, c]]) / 255.0;
                }
            }
        }

        Ok(Self {
            tensor,
            scale,
            offset_x: left as f64,
            offset_y: top as f64,
        })
    }

    /// Maps model-space corners back onto the source frame.
    fn to_frame(&self, c: Corners) -> Corners {
        [
            (c[0] - self.offset_x) / self.scale,
            (c[1] - self.offset_y) / self.scale,
            (c[2] - self.offset_x) / self.scale,
            (c[3] - self.offset_y) / self.scale,
        ]
    }
}

/// One anchor above the confidence threshold, in model space.
#[derive(Clone, Debug)]
struct Anchor {
    corners: Corners,
    score: f64,
}

/// Reads `[cx, cy, w, h, score, ...]` rows from a `[1, features, anchors]`
/// or `[1, anchors, features]` tensor. Pose keypoints after the score are
/// ignored. The layout is inferred from the smaller of the two dimensions
/// being the feature axis.
fn decode_anchors(
    data: &[f32],
    shape: &[usize],
    min_score: f64,
) -> Result<Vec<Anchor>, Box<dyn std::error::Error>> {
    let &[_, d1, d2] = shape else {
        return Err(format!("unexpected YOLO output shape {shape:?}").into());
    };
    let feature_major = d1 < d2;
    let (anchors, features) = if feature_major { (d2, d1) } else { (d1, d2) };
    if features < 5 || data.len() < anchors * features {
        return Err(format!("YOLO output {shape:?} is too small").into());
    }

    let at = |anchor: usize, feature: usize| {
        let i = if feature_major {
            feature * anchors + anchor
        } else {
            anchor * features + feature
        };
        f64::from(data[i])
    };

    Ok((0..anchors)
        .filter(|&a| at(a, 4) >= min_score)
        .map(|a| {
            let (cx, cy, half_w, half_h) = (at(a, 0), at(a, 1), at(a, 2) / 2.0, at(a, 3) / 2.0);
            Anchor {
                corners: [cx - half_w, cy - half_h, cx + half_w, cy + half_h],
                score: at(a, 4),
            }
        })
        .collect())
}

/// Keeps the best-scoring anchor of each overlapping cluster.
fn collapse_anchors(mut anchors: Vec<Anchor>, iou_thresh: f64) -> Vec<Anchor> {
    anchors.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<Anchor> = Vec::with_capacity(anchors.len());
    for anchor in anchors {
        if kept
            .iter()
            .all(|k| corner_iou(&k.corners, &anchor.corners) <= iou_thresh)
        {
            kept.push(anchor);
        }
    }
    kept
}
