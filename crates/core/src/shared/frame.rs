use ndarray::{s, ArrayView3};

use crate::shared::bounding_box::BoundingBox;

/// One decoded video frame: contiguous RGB bytes in row-major order.
///
/// `index` is the frame's 0-based position in the source stream, which is
/// what sampling and timestamps are computed from.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// `[height, width, channels]` view over the pixel buffer.
    pub fn as_ndarray(&self) -> Option<ArrayView3<'_, u8>> {
        ArrayView3::from_shape(
            (
                self.height as usize,
                self.width as usize,
                self.channels as usize,
            ),
            &self.data,
        )
        .ok()
    }

    /// Copies the pixels under `bbox` into a new frame carrying this
    /// frame's index.
    ///
    /// The box is clipped to the frame first; `None` when nothing remains.
    pub fn crop(&self, bbox: &BoundingBox) -> Option<Frame> {
        let clipped = bbox.clamp_to(self.width, self.height)?;
        let src = self.as_ndarray()?;

        let x1 = clipped.x() as usize;
        let y1 = clipped.y() as usize;
        let x2 = clipped.right() as usize;
        let y2 = clipped.bottom() as usize;

        let region = src.slice(s![y1..y2, x1..x2, ..]);
        let data: Vec<u8> = region.iter().copied().collect();

        Some(Frame::new(
            data,
            clipped.width() as u32,
            clipped.height() as u32,
            self.channels,
            self.index,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_frame(width: u32, height: u32) -> Frame {
        // Pixel (row, col) = [row, col, 0]
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for row in 0..height {
            for col in 0..width {
                data.extend_from_slice(&[row as u8, col as u8, 0]);
            }
        }
        Frame::new(data, width, height, 3, 7)
    }

    #[test]
    fn test_accessors_report_layout() {
        let frame = gradient_frame(4, 3);
        assert_eq!((frame.width(), frame.height(), frame.channels()), (4, 3, 3));
        assert_eq!(frame.index(), 7);
        assert_eq!(frame.data().len(), 36);
        assert_eq!(&frame.data()[9..12], &[0, 3, 0]);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2, 3, 0);
    }

    #[test]
    fn test_as_ndarray_shape() {
        let frame = gradient_frame(4, 2);
        let arr = frame.as_ndarray().unwrap();
        assert_eq!(arr.shape(), &[2, 4, 3]);
        assert_eq!(arr[[1, 3, 0]], 1);
    }

    #[test]
    fn test_crop_copies_region() {
        let frame = gradient_frame(20, 10);
        let bbox = BoundingBox::new(5, 2, 4, 3).unwrap();
        let crop = frame.crop(&bbox).unwrap();

        assert_eq!(crop.width(), 4);
        assert_eq!(crop.height(), 3);
        assert_eq!(crop.index(), 7);
        let arr = crop.as_ndarray().unwrap();
        assert_eq!(arr[[0, 0, 0]], 2); // row
        assert_eq!(arr[[0, 0, 1]], 5); // col
        assert_eq!(arr[[2, 3, 0]], 4);
        assert_eq!(arr[[2, 3, 1]], 8);
    }

    #[test]
    fn test_crop_clips_to_frame() {
        let frame = gradient_frame(20, 10);
        let bbox = BoundingBox::new(15, 8, 10, 10).unwrap();
        let crop = frame.crop(&bbox).unwrap();
        assert_eq!(crop.width(), 5);
        assert_eq!(crop.height(), 2);
        assert_eq!(crop.data().len(), 5 * 2 * 3);
    }

    #[test]
    fn test_crop_outside_frame_is_none() {
        let frame = gradient_frame(20, 10);
        let bbox = BoundingBox::new(50, 50, 10, 10).unwrap();
        assert!(frame.crop(&bbox).is_none());
    }
}
