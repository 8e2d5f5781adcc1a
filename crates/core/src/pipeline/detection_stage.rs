use crate::detection::domain::detection::Detection;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::non_max_suppressor::NonMaxSuppressor;
use crate::shared::frame::Frame;

use super::box_filter::BoxFilter;

/// Detector call, size floor and suppression for a single frame.
pub struct DetectionStage {
    detector: Box<dyn FaceDetector>,
    filter: BoxFilter,
    nms: NonMaxSuppressor,
}

impl DetectionStage {
    pub fn new(detector: Box<dyn FaceDetector>, filter: BoxFilter, nms: NonMaxSuppressor) -> Self {
        Self {
            detector,
            filter,
            nms,
        }
    }

    /// Returns the frame's clean detections in suppression pick order.
    ///
    /// A detector error counts as a frame with no faces.
    pub fn run(&mut self, frame: &Frame, timestamp_seconds: f64) -> Vec<Detection> {
        let raw = match self.detector.detect(frame) {
            Ok(boxes) => boxes,
            Err(e) => {
                log::warn!("Detection failed on frame {}: {e}", frame.index());
                return Vec::new();
            }
        };

        let sized = self.filter.apply(raw);
        self.nms
            .suppress(&sized)
            .into_iter()
            .map(|bbox| Detection {
                bbox,
                frame_index: frame.index(),
                timestamp_seconds,
            })
            .collect()
    }
}
