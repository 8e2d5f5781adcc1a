/// Selects which frames are analyzed and where they sit in time.
#[derive(Clone, Copy, Debug)]
pub struct FrameSampler {
    stride: usize,
    fps: f64,
}

impl FrameSampler {
    /// A stride of 0 is treated as 1.
    pub fn new(stride: usize, fps: f64) -> Self {
        Self {
            stride: stride.max(1),
            fps,
        }
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn should_analyze(&self, frame_index: usize) -> bool {
        frame_index % self.stride == 0
    }

    /// `frame_index / fps`, or 0 when the frame rate is unknown.
    pub fn timestamp_seconds(&self, frame_index: usize) -> f64 {
        if self.fps.is_finite() && self.fps > 0.0 {
            frame_index as f64 / self.fps
        } else {
            0.0
        }
    }

    /// Number of analyzed frames among the first `total_frames`.
    pub fn analyzed_count(&self, total_frames: usize) -> usize {
        total_frames.div_ceil(self.stride)
    }
}
