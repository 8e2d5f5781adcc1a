use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::detection::domain::face_detector::FaceDetector;
use crate::recognition::domain::face_embedder::FaceEmbedder;
use crate::recognition::domain::gallery::{Gallery, GalleryEntry, GalleryError};
use crate::recognition::domain::gallery_loader::GalleryLoader;
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;

/// Builds a gallery from a directory of reference photos.
///
/// Each image contributes one identity named after its file stem
/// (`alice.jpg` → `alice`), using the largest detected face. Images that
/// cannot be decoded or contain no usable face are skipped with a warning.
/// Files are visited in name order so the gallery order is reproducible.
pub struct ImageDirectoryGalleryLoader {
    dir: PathBuf,
    detector: Mutex<Box<dyn FaceDetector>>,
    embedder: Box<dyn FaceEmbedder>,
}

impl ImageDirectoryGalleryLoader {
    pub fn new(
        dir: impl Into<PathBuf>,
        detector: Box<dyn FaceDetector>,
        embedder: Box<dyn FaceEmbedder>,
    ) -> Self {
        Self {
            dir: dir.into(),
            detector: Mutex::new(detector),
            embedder,
        }
    }

    fn reference_images(&self) -> Result<Vec<PathBuf>, GalleryError> {
        let unreadable = |source| GalleryError::Unreadable {
            path: self.dir.clone(),
            source,
        };
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)
            .map_err(unreadable)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && has_image_extension(p))
            .collect();
        paths.sort();
        Ok(paths)
    }

    fn entry_for(&self, path: &Path) -> Result<Option<GalleryEntry>, Box<dyn std::error::Error>> {
        let Some(name) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            return Ok(None);
        };
        let frame = load_rgb_frame(path)?;

        let faces = {
            let mut detector = self
                .detector
                .lock()
                .map_err(|e| format!("Lock poisoned: {e}"))?;
            detector.detect(&frame)?
        };
        let Some(largest) = faces.iter().max_by_key(|b| b.area()) else {
            log::warn!("No face found in {}, skipping", path.display());
            return Ok(None);
        };

        match self.embedder.embed(&frame, largest)? {
            Some(embedding) => Ok(Some(GalleryEntry { name, embedding })),
            None => {
                log::warn!("Face in {} could not be embedded, skipping", path.display());
                Ok(None)
            }
        }
    }
}

impl GalleryLoader for ImageDirectoryGalleryLoader {
    fn load(&self) -> Result<Gallery, GalleryError> {
        let mut gallery = Gallery::new();
        for path in self.reference_images()? {
            match self.entry_for(&path) {
                Ok(Some(entry)) => {
                    let name = entry.name.clone();
                    match gallery.push(entry) {
                        Ok(()) => log::debug!("Loaded reference face {name:?}"),
                        Err(e) => log::warn!("Skipping {}: {e}", path.display()),
                    }
                }
                Ok(None) => {}
                Err(e) => log::warn!("Skipping {}: {e}", path.display()),
            }
        }
        log::info!(
            "Loaded {} known face(s) from {}",
            gallery.len(),
            self.dir.display()
        );
        Ok(gallery)
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn load_rgb_frame(path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
    let rgb = image::open(path)?.to_rgb8();
    let (width, height) = rgb.dimensions();
    Ok(Frame::new(rgb.into_raw(), width, height, 3, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::bounding_box::BoundingBox;

    /// Reports one face covering the whole image, plus a smaller one.
    struct WholeImageDetector;

    impl FaceDetector for WholeImageDetector {
        fn detect(
            &mut self,
            frame: &Frame,
        ) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
            Ok(vec![
                BoundingBox::new(0, 0, 2, 2).unwrap(),
                BoundingBox::new(0, 0, frame.width() as i32, frame.height() as i32).unwrap(),
            ])
        }
    }

    struct NoFaceDetector;

    impl FaceDetector for NoFaceDetector {
        fn detect(&mut self, _: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
            Ok(Vec::new())
        }
    }

    /// Embeds a face as `[mean red, box width]`.
    struct MeanColorEmbedder;

    impl FaceEmbedder for MeanColorEmbedder {
        fn embed(
            &self,
            frame: &Frame,
            bbox: &BoundingBox,
        ) -> Result<Option<Vec<f32>>, Box<dyn std::error::Error>> {
            let red: f32 = frame.data().iter().step_by(3).map(|&v| v as f32).sum();
            let pixels = (frame.width() * frame.height()) as f32;
            Ok(Some(vec![red / pixels, bbox.width() as f32]))
        }
    }

    /// Embedding length follows the image width.
    struct WidthSizedEmbedder;

    impl FaceEmbedder for WidthSizedEmbedder {
        fn embed(
            &self,
            frame: &Frame,
            _: &BoundingBox,
        ) -> Result<Option<Vec<f32>>, Box<dyn std::error::Error>> {
            Ok(Some(vec![1.0; frame.width() as usize]))
        }
    }

    fn write_image(dir: &Path, name: &str, red: u8) {
        write_sized_image(dir, name, 8, red);
    }

    fn write_sized_image(dir: &Path, name: &str, width: u32, red: u8) {
        let img = image::RgbImage::from_pixel(width, 6, image::Rgb([red, 0, 0]));
        img.save(dir.join(name)).unwrap();
    }

    #[test]
    fn test_loads_one_entry_per_image_named_by_stem() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "bob.png", 200);
        write_image(dir.path(), "alice.png", 100);

        let loader = ImageDirectoryGalleryLoader::new(
            dir.path(),
            Box::new(WholeImageDetector),
            Box::new(MeanColorEmbedder),
        );
        let gallery = loader.load().unwrap();

        let names: Vec<&str> = gallery.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);
        // Largest face used: width 8.
        assert_eq!(gallery.entries()[0].embedding, vec![100.0, 8.0]);
    }

    #[test]
    fn test_skips_images_without_faces() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "empty.png", 50);

        let loader = ImageDirectoryGalleryLoader::new(
            dir.path(),
            Box::new(NoFaceDetector),
            Box::new(MeanColorEmbedder),
        );
        assert!(loader.load().unwrap().is_empty());
    }

    #[test]
    fn test_skips_non_images_and_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "carol.png", 10);
        fs::write(dir.path().join("notes.txt"), b"hello").unwrap();
        fs::write(dir.path().join("broken.jpg"), b"not a jpeg").unwrap();

        let loader = ImageDirectoryGalleryLoader::new(
            dir.path(),
            Box::new(WholeImageDetector),
            Box::new(MeanColorEmbedder),
        );
        let gallery = loader.load().unwrap();
        assert_eq!(gallery.len(), 1);
        assert_eq!(gallery.entries()[0].name, "carol");
    }

    #[test]
    fn test_mismatched_dimension_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_sized_image(dir.path(), "a.png", 8, 10);
        write_sized_image(dir.path(), "b.png", 4, 10);
        write_sized_image(dir.path(), "c.png", 8, 10);

        let loader = ImageDirectoryGalleryLoader::new(
            dir.path(),
            Box::new(WholeImageDetector),
            Box::new(WidthSizedEmbedder),
        );
        let gallery = loader.load().unwrap();

        let names: Vec<&str> = gallery.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(gallery.dimension(), Some(8));
    }

    #[test]
    fn test_missing_directory_is_unreadable() {
        let loader = ImageDirectoryGalleryLoader::new(
            "/nonexistent/known_faces",
            Box::new(WholeImageDetector),
            Box::new(MeanColorEmbedder),
        );
        assert!(matches!(
            loader.load(),
            Err(GalleryError::Unreadable { .. })
        ));
    }
}
