//! Thumbnail resolution straight from disk.
//!
//! Nothing here caches. Every call re-reads the directory, so a rename, a
//! cover upload or a slate regeneration is visible on the very next listing.

use std::fs::Metadata;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::library::{ArtifactKind, LibraryLayout, default_title};
use crate::metadata::MetadataDocument;

/// One step of the resolution chain: which artifact to look for and what
/// counts as usable.
#[derive(Debug, Clone, Copy)]
pub struct ArtifactRule {
    pub kind: ArtifactKind,
    pub usable: fn(&Metadata) -> bool,
}

/// Ordered lookup chain; the first usable artifact wins.
pub const RESOLUTION_CHAIN: [ArtifactRule; 3] = [
    ArtifactRule {
        kind: ArtifactKind::CustomCover,
        usable: non_empty_file,
    },
    ArtifactRule {
        kind: ArtifactKind::ExtractedFrame,
        usable: non_empty_file,
    },
    ArtifactRule {
        kind: ArtifactKind::Slate,
        usable: non_empty_file,
    },
];

/// Zero-byte files are treated as absent so a write in progress is never served.
fn non_empty_file(meta: &Metadata) -> bool {
    meta.is_file() && meta.len() > 0
}

/// A listed video as exposed over the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAsset {
    pub id: String,
    pub title: String,
    pub url: String,
    pub thumb: Option<String>,
    pub size: u64,
    /// Unix milliseconds.
    pub uploaded_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    pub video_url: String,
    pub thumb_url: Option<String>,
    pub thumb_kind: Option<ArtifactKind>,
}

#[derive(Debug, Clone)]
pub struct AssetResolver {
    layout: LibraryLayout,
}

impl AssetResolver {
    pub fn new(layout: LibraryLayout) -> Self {
        Self { layout }
    }

    /// Highest-priority usable artifact for `id`, if any.
    pub async fn best_artifact(&self, id: &str) -> Result<Option<ArtifactKind>> {
        for rule in RESOLUTION_CHAIN {
            let path = self.layout.artifact_path(id, rule.kind)?;
            if let Ok(meta) = tokio::fs::metadata(&path).await
                && (rule.usable)(&meta)
            {
                return Ok(Some(rule.kind));
            }
        }
        Ok(None)
    }

    pub async fn resolve(&self, id: &str) -> Result<ResolvedAsset> {
        let id = self.layout.validate_id(id)?;
        let thumb_kind = self.best_artifact(id).await?;
        Ok(ResolvedAsset {
            video_url: LibraryLayout::public_url(id),
            thumb_url: thumb_kind.map(|kind| LibraryLayout::public_url(&kind.file_name(id))),
            thumb_kind,
        })
    }

    /// Enumerate every source video in the library, sorted by id.
    pub async fn list(&self, metadata: &MetadataDocument) -> Result<Vec<VideoAsset>> {
        let mut entries = match tokio::fs::read_dir(self.layout.root()).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut assets = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if self.layout.validate_id(&name).is_err() {
                continue;
            }

            // Entries can vanish between readdir and stat under a concurrent delete.
            let meta = match entry.metadata().await {
                Ok(meta) if meta.is_file() => meta,
                Ok(_) => continue,
                Err(err) => {
                    debug!(id = %name, error = %err, "skipping unreadable entry");
                    continue;
                }
            };

            let resolved = self.resolve(&name).await?;
            let title = metadata
                .title(&name)
                .map(str::to_string)
                .unwrap_or_else(|| default_title(&name));

            assets.push(VideoAsset {
                title,
                url: resolved.video_url,
                thumb: resolved.thumb_url,
                size: meta.len(),
                uploaded_at: uploaded_at_millis(&meta),
                id: name,
            });
        }

        assets.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(assets)
    }
}

/// Creation time where the filesystem records one, else modification time.
fn uploaded_at_millis(meta: &Metadata) -> u64 {
    meta.created()
        .or_else(|_| meta.modified())
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map(|since| since.as_millis() as u64)
        .unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or_default()
        })
}
