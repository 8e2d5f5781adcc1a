use serde::Serialize;

/// Axis-aligned face rectangle in frame pixels, top-left origin.
///
/// Width and height are always positive: construction rejects degenerate
/// rectangles, so geometry below never divides by a zero area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct BoundingBox {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

impl BoundingBox {
    /// Returns `None` when `width` or `height` is not positive, or when
    /// the right or bottom edge does not fit in `i32`.
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Option<Self> {
        if width <= 0 || height <= 0 {
            return None;
        }
        x.checked_add(width)?;
        y.checked_add(height)?;
        Some(Self {
            x,
            y,
            width,
            height,
        })
    }

    /// Builds a box from floating-point corner coordinates, rounding the
    /// corners to the nearest pixel.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Option<Self> {
        if !(x1.is_finite() && y1.is_finite() && x2.is_finite() && y2.is_finite()) {
            return None;
        }
        let left = x1.round() as i32;
        let top = y1.round() as i32;
        let right = x2.round() as i32;
        let bottom = y2.round() as i32;
        Self::new(left, top, right.checked_sub(left)?, bottom.checked_sub(top)?)
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    /// Area of the axis-aligned intersection, 0 when the boxes are disjoint
    /// or only touch along an edge.
    pub fn intersection_area(&self, other: &BoundingBox) -> i64 {
        let ix1 = i64::from(self.x.max(other.x));
        let iy1 = i64::from(self.y.max(other.y));
        let ix2 = i64::from(self.right().min(other.right()));
        let iy2 = i64::from(self.bottom().min(other.bottom()));

        (ix2 - ix1).max(0) * (iy2 - iy1).max(0)
    }

    /// Intersection area normalized by the smaller of the two areas.
    ///
    /// A small box fully inside a large one yields 1.0 regardless of the
    /// large box's size.
    pub fn overlap_ratio(&self, other: &BoundingBox) -> f64 {
        let inter = self.intersection_area(other);
        if inter == 0 {
            return 0.0;
        }
        inter as f64 / self.area().min(other.area()) as f64
    }

    /// Clips the box to a `frame_w` × `frame_h` frame.
    ///
    /// Returns `None` when nothing of the box lies inside the frame.
    pub fn clamp_to(&self, frame_w: u32, frame_h: u32) -> Option<BoundingBox> {
        let fw = i32::try_from(frame_w).unwrap_or(i32::MAX);
        let fh = i32::try_from(frame_h).unwrap_or(i32::MAX);

        let x1 = self.x.clamp(0, fw);
        let y1 = self.y.clamp(0, fh);
        let x2 = self.right().clamp(0, fw);
        let y2 = self.bottom().clamp(0, fh);
        BoundingBox::new(x1, y1, x2 - x1, y2 - y1)
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(x={}, y={}, w={}, h={})",
            self.x, self.y, self.width, self.height
        )
    }
}
