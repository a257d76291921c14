//! Sidecar metadata: the `id -> {title}` record stored next to the videos.
//!
//! The sidecar is advisory. A missing or unreadable file loads as an empty
//! mapping and every consumer falls back to filename-derived titles.

pub mod store;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::library::atomic::write_atomic;

pub use store::MetadataStore;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    #[serde(default)]
    pub title: String,
}

impl MetadataRecord {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    /// The stored title, if it holds anything besides whitespace.
    pub fn title(&self) -> Option<&str> {
        let trimmed = self.title.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

/// Whole-file contents of the sidecar, `{"items": {"<id>": {"title": ".."}}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataDocument {
    #[serde(default)]
    pub items: BTreeMap<String, MetadataRecord>,
}

impl MetadataDocument {
    pub fn title(&self, id: &str) -> Option<&str> {
        self.items.get(id).and_then(MetadataRecord::title)
    }
}

/// Direct access to the sidecar file. Mutations should go through
/// [`MetadataStore`] so concurrent writers are serialised.
#[derive(Debug, Clone)]
pub struct MetadataFile {
    path: PathBuf,
}

impl MetadataFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole mapping. Never fails: missing or corrupt files load as
    /// an empty mapping.
    pub async fn load(&self) -> MetadataDocument {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no metadata sidecar yet");
                return MetadataDocument::default();
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to read metadata sidecar");
                return MetadataDocument::default();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(doc) => doc,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "metadata sidecar is corrupt, treating as empty");
                MetadataDocument::default()
            }
        }
    }

    /// Overwrite the whole sidecar with `doc`.
    pub async fn save(&self, doc: &MetadataDocument) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(doc)?;
        write_atomic(&self.path, &bytes).await?;
        Ok(())
    }
}
