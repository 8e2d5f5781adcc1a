use std::path::{Path, PathBuf};

use crate::detection::domain::unique_face_tracker::RetainedFace;
use crate::shared::frame::Frame;
use crate::video::domain::artifact_sink::ArtifactSink;

/// Writes each retained face crop to `<dir>/<video-stem>_face_<NNNN>.jpg`
/// using the `image` crate, returning the written path as the reference.
pub struct ImageFileArtifactSink {
    output_dir: PathBuf,
    video_stem: String,
}

impl ImageFileArtifactSink {
    pub fn new(output_dir: impl Into<PathBuf>, video_stem: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            video_stem: video_stem.into(),
        }
    }

    /// Uses the file stem of `video_path`, or `video` if it has none.
    pub fn for_video(output_dir: impl Into<PathBuf>, video_path: &Path) -> Self {
        let stem = video_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "video".to_string());
        Self::new(output_dir, stem)
    }

    pub fn video_stem(&self) -> &str {
        &self.video_stem
    }

    pub fn path_for(&self, saved_index: usize) -> PathBuf {
        self.output_dir
            .join(format!("{}_face_{saved_index:04}.jpg", self.video_stem))
    }
}

impl ArtifactSink for ImageFileArtifactSink {
    fn save(
        &mut self,
        crop: &Frame,
        face: &RetainedFace,
    ) -> Result<String, Box<dyn std::error::Error>> {
        std::fs::create_dir_all(&self.output_dir)?;

        if crop.channels() != 3 {
            return Err(format!("Expected an RGB crop, got {} channels", crop.channels()).into());
        }
        let img = image::RgbImage::from_raw(crop.width(), crop.height(), crop.data().to_vec())
            .ok_or("Failed to create image from crop data")?;

        let path = self.path_for(face.saved_index);
        img.save(&path)?;
        log::debug!("Saved face {} to {}", face.saved_index, path.display());
        Ok(path.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::bounding_box::BoundingBox;

    fn make_crop(width: u32, height: u32, rgb: [u8; 3]) -> Frame {
        let data = rgb.repeat((width * height) as usize);
        Frame::new(data, width, height, 3, 0)
    }

    fn face(saved_index: usize) -> RetainedFace {
        RetainedFace {
            bbox: BoundingBox::new(0, 0, 60, 60).unwrap(),
            first_seen_frame: 0,
            saved_index,
        }
    }

    #[test]
    fn test_save_names_file_after_video_and_index() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = ImageFileArtifactSink::for_video(dir.path(), Path::new("/videos/lobby.mp4"));

        let reference = sink.save(&make_crop(60, 60, [50, 100, 200]), &face(7)).unwrap();

        let expected = dir.path().join("lobby_face_0007.jpg");
        assert_eq!(PathBuf::from(&reference), expected);
        assert!(expected.exists());
    }

    #[test]
    fn test_stem_taken_from_video_path() {
        let sink = ImageFileArtifactSink::for_video("out", Path::new("/tmp/cam 01.mp4"));
        assert_eq!(sink.video_stem(), "cam 01");
        assert_eq!(sink.path_for(3), Path::new("out").join("cam 01_face_0003.jpg"));
    }

    #[test]
    fn test_stemless_path_falls_back_to_video() {
        let sink = ImageFileArtifactSink::for_video("out", Path::new("/"));
        assert_eq!(sink.video_stem(), "video");
    }

    #[test]
    fn test_saved_image_has_crop_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = ImageFileArtifactSink::new(dir.path(), "clip");
        let reference = sink.save(&make_crop(40, 30, [128, 128, 128]), &face(0)).unwrap();

        let img = image::open(&reference).unwrap();
        assert_eq!(img.width(), 40);
        assert_eq!(img.height(), 30);
    }

    #[test]
    fn test_creates_missing_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("faces").join("run1");
        let mut sink = ImageFileArtifactSink::new(&nested, "clip");

        sink.save(&make_crop(10, 10, [0, 0, 0]), &face(1)).unwrap();
        assert!(nested.join("clip_face_0001.jpg").exists());
    }

    #[test]
    fn test_rejects_non_rgb_crop() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = ImageFileArtifactSink::new(dir.path(), "clip");
        let gray = Frame::new(vec![0u8; 100], 10, 10, 1, 0);
        assert!(sink.save(&gray, &face(0)).is_err());
    }

    #[test]
    fn test_output_dir_blocked_by_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("faces");
        std::fs::write(&blocker, b"file, not a directory").unwrap();

        let mut sink = ImageFileArtifactSink::new(&blocker, "clip");
        assert!(sink.save(&make_crop(10, 10, [0, 0, 0]), &face(0)).is_err());
    }
}
