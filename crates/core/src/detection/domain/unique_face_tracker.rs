use serde::Serialize;

use crate::shared::bounding_box::BoundingBox;

pub const DEFAULT_UNIQUENESS_THRESHOLD: f64 = 0.3;

/// A face accepted as new, in acceptance order.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RetainedFace {
    pub bbox: BoundingBox,
    pub first_seen_frame: usize,
    /// 0-based position in the retained list; also the artifact index.
    pub saved_index: usize,
}

/// Remembers every face retained so far in one run and rejects positional
/// duplicates.
///
/// A candidate `(x, y, w, h)` duplicates a retained `(sx, sy, sw, sh)` when
/// `|x - sx|`, `|w - sw|` are both below `w * threshold` and `|y - sy|`,
/// `|h - sh|` are both below `h * threshold`. Tolerances scale with the
/// candidate, not the retained box, so the test is not symmetric.
///
/// Retained boxes never expire, so a different face appearing later at a
/// previously retained position and size is still treated as seen.
#[derive(Debug)]
pub struct UniqueFaceTracker {
    threshold: f64,
    retained: Vec<RetainedFace>,
}

impl UniqueFaceTracker {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            retained: Vec::new(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_duplicate(&self, candidate: &BoundingBox) -> bool {
        self.retained
            .iter()
            .any(|face| self.matches(candidate, &face.bbox))
    }

    fn matches(&self, candidate: &BoundingBox, seen: &BoundingBox) -> bool {
        let tol_w = candidate.width() as f64 * self.threshold;
        let tol_h = candidate.height() as f64 * self.threshold;
        let diff = |a: i32, b: i32| (a as f64 - b as f64).abs();

        diff(candidate.x(), seen.x()) < tol_w
            && diff(candidate.y(), seen.y()) < tol_h
            && diff(candidate.width(), seen.width()) < tol_w
            && diff(candidate.height(), seen.height()) < tol_h
    }

    /// Retains `candidate` unless it duplicates an earlier face.
    ///
    /// Returns the newly retained face, or `None` for a duplicate.
    pub fn observe(&mut self, candidate: BoundingBox, frame_index: usize) -> Option<RetainedFace> {
        if self.is_duplicate(&candidate) {
            log::trace!("Frame {frame_index}: {candidate} duplicates a retained face");
            return None;
        }
        let face = RetainedFace {
            bbox: candidate,
            first_seen_frame: frame_index,
            saved_index: self.retained.len(),
        };
        self.retained.push(face);
        Some(face)
    }

    pub fn retained(&self) -> &[RetainedFace] {
        &self.retained
    }

    pub fn len(&self) -> usize {
        self.retained.len()
    }

    pub fn is_empty(&self) -> bool {
        self.retained.is_empty()
    }

    pub fn into_retained(self) -> Vec<RetainedFace> {
        self.retained
    }
}

impl Default for UniqueFaceTracker {
    fn default() -> Self {
        Self::new(DEFAULT_UNIQUENESS_THRESHOLD)
    }
}
