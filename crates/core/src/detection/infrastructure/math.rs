//! Float helpers for model outputs.

/// Corner-form box `[x1, y1, x2, y2]` in model pixel space.
pub type Corners = [f64; 4];

fn corner_area(c: &Corners) -> f64 {
    (c[2] - c[0]).max(0.0) * (c[3] - c[1]).max(0.0)
}

/// Intersection over union of two corner-form boxes; 0 for disjoint or
/// degenerate pairs.
pub fn corner_iou(a: &Corners, b: &Corners) -> f64 {
    let overlap = [a[0].max(b[0]), a[1].max(b[1]), a[2].min(b[2]), a[3].min(b[3])];
    let inter = corner_area(&overlap);
    let union = corner_area(a) + corner_area(b) - inter;
    if inter <= 0.0 || union <= 0.0 {
        0.0
    } else {
        inter / union
    }
}

/// Rescales `v` to unit Euclidean length. Returns `false`, leaving `v`
/// untouched, when the norm is zero or not finite.
pub fn l2_normalize(v: &mut [f32]) -> bool {
    let norm = v.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return false;
    }
    v.iter_mut().for_each(|x| *x = (f64::from(*x) / norm) as f32);
    true
}
