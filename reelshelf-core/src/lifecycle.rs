//! Rename, delete and slate regeneration for stored videos.

use tracing::{debug, info, warn};

use crate::error::{LibraryError, Result};
use crate::library::{ArtifactKind, LibraryLayout, default_title};
use crate::metadata::MetadataStore;
use crate::slate::{SlateGenerator, Theme};

#[derive(Debug, Clone)]
pub struct LifecycleManager {
    layout: LibraryLayout,
    metadata: MetadataStore,
    slates: SlateGenerator,
}

impl LifecycleManager {
    pub fn new(layout: LibraryLayout, metadata: MetadataStore, slates: SlateGenerator) -> Self {
        Self {
            layout,
            metadata,
            slates,
        }
    }

    async fn require_source(&self, id: &str) -> Result<()> {
        let path = self.layout.source_path(id)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(()),
            Ok(_) => Err(LibraryError::NotFound(id.to_string())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(LibraryError::NotFound(id.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Change the title of `id`. Artifacts are left as they are.
    pub async fn rename(&self, id: &str, title: &str) -> Result<()> {
        let title = title.trim();
        if title.is_empty() {
            return Err(LibraryError::Validation("title must not be blank".to_string()));
        }
        let source = self.layout.source_path(id)?;
        self.metadata.set_title(id, title, &source).await?;
        info!(%id, title, "video renamed");
        Ok(())
    }

    /// Remove the source, every derived artifact and the metadata record.
    ///
    /// Only the source removal can fail the call. Missing artifacts and a
    /// failed metadata save are logged and ignored.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let source = self.layout.source_path(id)?;
        match tokio::fs::remove_file(&source).await {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(LibraryError::NotFound(id.to_string()));
            }
            Err(err) => return Err(err.into()),
        }

        for kind in ArtifactKind::PRIORITY {
            let path = self.layout.artifact_path(id, kind)?;
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!(%id, artifact = kind.as_str(), "artifact removed"),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => {
                    warn!(%id, artifact = kind.as_str(), error = %err, "failed to remove artifact")
                }
            }
        }

        if let Err(err) = self.metadata.remove(id).await {
            warn!(%id, error = %err, "failed to drop metadata record");
        }

        info!(%id, "video deleted");
        Ok(())
    }

    /// Rewrite the slate for `id` in `theme`. Returns the slate's file name.
    pub async fn regenerate_slate(&self, id: &str, theme: Theme) -> Result<String> {
        self.require_source(id).await?;

        let title = match self.metadata.title(id).await {
            Some(title) => title,
            None => default_title(id),
        };
        let path = self.layout.artifact_path(id, ArtifactKind::Slate)?;
        self.slates
            .write(&title, theme, &path)
            .await
            .map_err(LibraryError::Generation)?;

        info!(%id, %theme, "slate regenerated");
        Ok(ArtifactKind::Slate.file_name(id))
    }
}
