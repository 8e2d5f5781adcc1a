use std::cmp::Reverse;

use crate::shared::bounding_box::BoundingBox;

pub const DEFAULT_OVERLAP_THRESHOLD: f64 = 0.5;

/// Collapses overlapping boxes from one frame into one box per face.
///
/// Largest-first: the most complete capture of a face wins over partial
/// crops of it. Overlap is measured with [`BoundingBox::overlap_ratio`].
#[derive(Clone, Copy, Debug)]
pub struct NonMaxSuppressor {
    overlap_threshold: f64,
}

impl NonMaxSuppressor {
    pub fn new(overlap_threshold: f64) -> Self {
        Self { overlap_threshold }
    }

    pub fn overlap_threshold(&self) -> f64 {
        self.overlap_threshold
    }

    /// Returns the surviving boxes in pick order (largest first).
    ///
    /// Equal areas keep their input order, so the output is fully
    /// determined by the input sequence.
    pub fn suppress(&self, boxes: &[BoundingBox]) -> Vec<BoundingBox> {
        let mut remaining = boxes.to_vec();
        remaining.sort_by_key(|b| Reverse(b.area()));

        let mut picked: Vec<BoundingBox> = Vec::with_capacity(remaining.len());
        for candidate in remaining {
            let suppressed = picked
                .iter()
                .any(|kept| kept.overlap_ratio(&candidate) > self.overlap_threshold);
            if !suppressed {
                picked.push(candidate);
            }
        }
        picked
    }
}

impl Default for NonMaxSuppressor {
    fn default() -> Self {
        Self::new(DEFAULT_OVERLAP_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn bbox(x: i32, y: i32, w: i32, h: i32) -> BoundingBox {
        BoundingBox::new(x, y, w, h).unwrap()
    }

    fn assert_no_pair_above(boxes: &[BoundingBox], threshold: f64) {
        for (i, a) in boxes.iter().enumerate() {
            for b in &boxes[i + 1..] {
                assert!(
                    a.overlap_ratio(b) <= threshold,
                    "{a} and {b} overlap by {}",
                    a.overlap_ratio(b)
                );
            }
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(NonMaxSuppressor::default().suppress(&[]).is_empty());
    }

    #[test]
    fn test_single_box_passes() {
        let boxes = vec![bbox(10, 10, 60, 60)];
        assert_eq!(NonMaxSuppressor::default().suppress(&boxes), boxes);
    }

    #[test]
    fn test_contained_box_drops_and_larger_wins() {
        let inner = bbox(120, 120, 40, 40);
        let outer = bbox(100, 100, 100, 100);
        let result = NonMaxSuppressor::default().suppress(&[inner, outer]);
        assert_eq!(result, vec![outer]);
    }

    #[test]
    fn test_disjoint_boxes_all_kept_largest_first() {
        let small = bbox(0, 0, 50, 50);
        let large = bbox(300, 300, 90, 90);
        let medium = bbox(600, 0, 70, 70);
        let result = NonMaxSuppressor::default().suppress(&[small, large, medium]);
        assert_eq!(result, vec![large, medium, small]);
    }

    #[test]
    fn test_overlap_at_threshold_is_kept() {
        // 100x100 and 100x100 offset by 50 → overlap ratio exactly 0.5.
        let a = bbox(0, 0, 100, 100);
        let b = bbox(50, 0, 100, 100);
        let result = NonMaxSuppressor::default().suppress(&[a, b]);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_overlap_above_threshold_is_suppressed() {
        let a = bbox(0, 0, 100, 100);
        let b = bbox(40, 0, 100, 100);
        let result = NonMaxSuppressor::default().suppress(&[a, b]);
        assert_eq!(result, vec![a]);
    }

    #[test]
    fn test_equal_area_tie_keeps_input_order() {
        let first = bbox(0, 0, 60, 60);
        let second = bbox(10, 10, 60, 60);
        assert_eq!(
            NonMaxSuppressor::default().suppress(&[first, second]),
            vec![first]
        );
        assert_eq!(
            NonMaxSuppressor::default().suppress(&[second, first]),
            vec![second]
        );
    }

    #[test]
    fn test_suppressed_box_does_not_suppress_others() {
        // b overlaps a heavily and is dropped; c overlaps only b, so c survives.
        let a = bbox(0, 0, 100, 100);
        let b = bbox(30, 0, 90, 90);
        let c = bbox(95, 0, 40, 40);
        let result = NonMaxSuppressor::default().suppress(&[a, b, c]);
        assert_eq!(result, vec![a, c]);
    }

    #[test]
    fn test_deterministic_for_same_input() {
        let boxes = vec![
            bbox(0, 0, 60, 60),
            bbox(5, 5, 60, 60),
            bbox(200, 200, 80, 80),
            bbox(210, 190, 70, 75),
            bbox(400, 50, 60, 60),
        ];
        let nms = NonMaxSuppressor::default();
        let first = nms.suppress(&boxes);
        for _ in 0..5 {
            assert_eq!(nms.suppress(&boxes), first);
        }
    }

    #[rstest]
    #[case::strict(0.1)]
    #[case::default(0.5)]
    #[case::lenient(0.9)]
    fn test_output_is_subset_with_no_pair_above_threshold(#[case] threshold: f64) {
        let boxes: Vec<BoundingBox> = (0..12)
            .map(|i| bbox((i * 37) % 200, (i * 53) % 150, 50 + (i % 4) * 10, 50 + (i % 3) * 15))
            .collect();
        let result = NonMaxSuppressor::new(threshold).suppress(&boxes);

        assert!(!result.is_empty());
        assert!(result.iter().all(|b| boxes.contains(b)));
        assert_no_pair_above(&result, threshold);
    }
}
