use std::path::PathBuf;

use crate::recognition::domain::gallery::{Gallery, GalleryEntry, GalleryError};
use crate::recognition::domain::gallery_loader::GalleryLoader;

/// Loads precomputed embeddings from a JSON array of
/// `{"name": ..., "embedding": [...]}` objects.
pub struct JsonGalleryLoader {
    path: PathBuf,
}

impl JsonGalleryLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl GalleryLoader for JsonGalleryLoader {
    fn load(&self) -> Result<Gallery, GalleryError> {
        let contents =
            std::fs::read_to_string(&self.path).map_err(|source| GalleryError::Unreadable {
                path: self.path.clone(),
                source,
            })?;
        let values: Vec<serde_json::Value> =
            serde_json::from_str(&contents).map_err(|source| GalleryError::Malformed {
                path: self.path.clone(),
                source,
            })?;

        let mut gallery = Gallery::new();
        for (position, value) in values.into_iter().enumerate() {
            let added = serde_json::from_value::<GalleryEntry>(value)
                .map_err(|e| e.to_string())
                .and_then(|entry| gallery.push(entry).map_err(|e| e.to_string()));
            if let Err(reason) = added {
                log::warn!(
                    "Skipping gallery entry {position} in {}: {reason}",
                    self.path.display()
                );
            }
        }
        log::info!(
            "Loaded {} known face(s) from {}",
            gallery.len(),
            self.path.display()
        );
        Ok(gallery)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_loads_entries_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gallery.json");
        fs::write(
            &path,
            r#"[{"name": "zoe", "embedding": [0.1, 0.2]}, {"name": "adam", "embedding": [0.3, 0.4]}]"#,
        )
        .unwrap();

        let gallery = JsonGalleryLoader::new(&path).load().unwrap();
        assert_eq!(gallery.len(), 2);
        assert_eq!(gallery.entries()[0].name, "zoe");
        assert_eq!(gallery.dimension(), Some(2));
    }

    #[test]
    fn test_empty_array_is_empty_gallery() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gallery.json");
        fs::write(&path, "[]").unwrap();

        assert!(JsonGalleryLoader::new(&path).load().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gallery.json");
        fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            JsonGalleryLoader::new(&path).load(),
            Err(GalleryError::Malformed { .. })
        ));
    }

    #[test]
    fn test_bad_entries_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gallery.json");
        fs::write(
            &path,
            r#"[
                {"name": "alice", "embedding": [1.0, 0.0]},
                {"name": "ghost", "embedding": []},
                {"name": "wide", "embedding": [1.0, 0.0, 0.0]},
                {"embedding": [0.5, 0.5]},
                "carol",
                {"name": "bob", "embedding": [0.0, 1.0]}
            ]"#,
        )
        .unwrap();

        let gallery = JsonGalleryLoader::new(&path).load().unwrap();
        let names: Vec<&str> = gallery.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);
        assert_eq!(gallery.dimension(), Some(2));
    }

    #[test]
    fn test_top_level_object_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gallery.json");
        fs::write(&path, r#"{"name": "alice", "embedding": [1.0]}"#).unwrap();

        assert!(matches!(
            JsonGalleryLoader::new(&path).load(),
            Err(GalleryError::Malformed { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        assert!(matches!(
            JsonGalleryLoader::new("/nonexistent/gallery.json").load(),
            Err(GalleryError::Unreadable { .. })
        ));
    }
}
