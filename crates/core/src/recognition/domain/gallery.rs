use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("gallery source {path} is unreadable: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("gallery file {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("identity {name:?} has an empty embedding")]
    EmptyEmbedding { name: String },
    #[error("identity {name:?} has a non-finite embedding value")]
    NonFiniteEmbedding { name: String },
    #[error("identity {name:?} has dimension {found}, gallery uses {expected}")]
    DimensionMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("failed to prepare gallery: {0}")]
    Setup(String),
}

/// One known person: a display name and their reference embedding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GalleryEntry {
    pub name: String,
    pub embedding: Vec<f32>,
}

/// Known identities, all with embeddings of the same dimension.
///
/// Read-only during a run; order is load order, which decides ties.
#[derive(Clone, Debug, Default)]
pub struct Gallery {
    entries: Vec<GalleryEntry>,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a gallery from entries, rejecting the first invalid one.
    pub fn from_entries(
        entries: impl IntoIterator<Item = GalleryEntry>,
    ) -> Result<Self, GalleryError> {
        let mut gallery = Self::new();
        for entry in entries {
            gallery.push(entry)?;
        }
        Ok(gallery)
    }

    pub fn push(&mut self, entry: GalleryEntry) -> Result<(), GalleryError> {
        if entry.embedding.is_empty() {
            return Err(GalleryError::EmptyEmbedding { name: entry.name });
        }
        if entry.embedding.iter().any(|v| !v.is_finite()) {
            return Err(GalleryError::NonFiniteEmbedding { name: entry.name });
        }
        if let Some(expected) = self.dimension() {
            if entry.embedding.len() != expected {
                return Err(GalleryError::DimensionMismatch {
                    name: entry.name,
                    expected,
                    found: entry.embedding.len(),
                });
            }
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Embedding length shared by every entry; `None` while empty.
    pub fn dimension(&self) -> Option<usize> {
        self.entries.first().map(|e| e.embedding.len())
    }

    pub fn entries(&self) -> &[GalleryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
