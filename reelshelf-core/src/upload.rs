//! Upload orchestration.
//!
//! Each uploaded file is streamed into a hidden staging file first, so a
//! half-received body is never listed and a dropped request leaves nothing
//! behind. Once the whole request has been received the batch is finished:
//! every file is moved to its id and given a slate, titles are recorded with
//! one metadata save, and only then are frame extractions fanned out and
//! joined. A failed extraction leaves the slate in place and never fails the
//! batch.

use std::path::Path;
use std::sync::Arc;

use futures::future::join_all;
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::error::{LibraryError, Result};
use crate::frames::FrameSource;
use crate::library::atomic::{StagedFile, staging_path};
use crate::library::{
    ArtifactKind, IdGenerator, LibraryLayout, default_title, sanitize_file_name,
    title_from_original_name,
};
use crate::metadata::MetadataStore;
use crate::slate::{SlateGenerator, Theme};

const MAX_ID_ATTEMPTS: usize = 8;

/// A received source file that is not part of the library yet.
///
/// Dropping it before [`UploadOrchestrator::handle`] has finished it removes
/// the file again.
#[derive(Debug)]
pub struct StoredUpload {
    pub id: String,
    pub title: String,
    pub size: u64,
    original_name: String,
    file: StagedFile,
}

impl StoredUpload {
    /// Where the bytes currently live: the staging file until the upload is
    /// finished, the source path afterwards.
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

pub struct UploadOrchestrator {
    layout: LibraryLayout,
    ids: IdGenerator,
    metadata: MetadataStore,
    slates: SlateGenerator,
    frames: Arc<dyn FrameSource>,
    theme: Theme,
    max_video_bytes: u64,
}

impl std::fmt::Debug for UploadOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadOrchestrator")
            .field("root", &self.layout.root())
            .field("frames", &self.frames.name())
            .field("theme", &self.theme)
            .field("max_video_bytes", &self.max_video_bytes)
            .finish()
    }
}

impl UploadOrchestrator {
    pub fn new(
        layout: LibraryLayout,
        metadata: MetadataStore,
        slates: SlateGenerator,
        frames: Arc<dyn FrameSource>,
        theme: Theme,
        max_video_bytes: u64,
    ) -> Self {
        Self {
            layout,
            ids: IdGenerator::new(),
            metadata,
            slates,
            frames,
            theme,
            max_video_bytes,
        }
    }

    /// Stream one uploaded file into a staging file under a fresh id.
    ///
    /// Files whose name does not carry an allowed video extension are
    /// rejected with [`LibraryError::UnsupportedMedia`] before anything is
    /// written. Bodies over the size cap are removed again and reported as
    /// [`LibraryError::TooLarge`].
    pub async fn store_source<R>(&self, original_name: &str, reader: R) -> Result<StoredUpload>
    where
        R: AsyncRead + Unpin,
    {
        let safe_name = sanitize_file_name(original_name);
        if !self.layout.is_video_name(&safe_name) {
            return Err(LibraryError::UnsupportedMedia(format!(
                "{original_name} is not a recognised video file"
            )));
        }

        let id = self.ids.next_id(original_name);
        let staged = staging_path(&self.layout.source_path(&id)?, None);
        let mut out = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&staged)
            .await?;
        let file = StagedFile::new(staged);

        let mut limited = reader.take(self.max_video_bytes.saturating_add(1));
        let size = tokio::io::copy(&mut limited, &mut out).await?;
        out.flush().await?;
        drop(out);

        if size > self.max_video_bytes {
            return Err(LibraryError::TooLarge {
                limit: self.max_video_bytes,
            });
        }

        let mut title = title_from_original_name(original_name);
        if title.is_empty() {
            title = default_title(&id);
        }

        debug!(%id, size, "received upload");
        Ok(StoredUpload {
            id,
            title,
            size,
            original_name: original_name.to_string(),
            file,
        })
    }

    /// Move a staged upload to its source path. The link refuses to replace
    /// an existing file, so a taken id draws a fresh one.
    async fn place_source(&self, upload: &mut StoredUpload) -> Result<()> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let path = self.layout.source_path(&upload.id)?;
            match fs::hard_link(upload.file.path(), &path).await {
                Ok(()) => {
                    let staged = upload.file.retarget(path);
                    if let Err(err) = fs::remove_file(&staged).await {
                        debug!(id = %upload.id, error = %err, "failed to remove staging file");
                    }
                    return Ok(());
                }
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                    debug!(id = %upload.id, "id already taken, drawing another");
                    upload.id = self.ids.next_id(&upload.original_name);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(LibraryError::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            "could not allocate a unique video id",
        )))
    }

    /// Finish a batch of stored uploads and return how many were accepted.
    ///
    /// A source only stays in the library once its slate is written; if this
    /// future is dropped before that point the source is removed again.
    pub async fn handle(&self, batch: Vec<StoredUpload>) -> usize {
        if batch.is_empty() {
            return 0;
        }

        let recorded = self.metadata.snapshot().await;
        let mut placed = Vec::with_capacity(batch.len());
        for mut upload in batch {
            if let Err(err) = self.place_source(&mut upload).await {
                warn!(id = %upload.id, error = %err, "failed to place upload, dropping it");
                continue;
            }

            // A record that already exists keeps its title; render what listings will show.
            let title = recorded.title(&upload.id).unwrap_or(&upload.title);
            match self.layout.artifact_path(&upload.id, ArtifactKind::Slate) {
                Ok(slate_path) => {
                    if let Err(err) = self.slates.write(title, self.theme, &slate_path).await {
                        warn!(id = %upload.id, error = %err, "failed to write slate");
                    }
                }
                Err(err) => warn!(id = %upload.id, error = %err, "no slate path for upload"),
            }
            upload.file.keep();
            placed.push(upload);
        }

        let titles = placed
            .iter()
            .map(|upload| (upload.id.clone(), upload.title.clone()))
            .collect();
        if let Err(err) = self.metadata.insert_missing(titles).await {
            warn!(error = %err, "failed to record titles, listing will use filename titles");
        }

        let extractions = placed.iter().map(|upload| async move {
            let Ok(frame_path) = self.layout.artifact_path(&upload.id, ArtifactKind::ExtractedFrame)
            else {
                return false;
            };
            match self.frames.extract(upload.path(), &frame_path).await {
                Ok(()) => true,
                Err(_) => {
                    debug!(id = %upload.id, source = self.frames.name(), "no frame extracted, keeping slate");
                    false
                }
            }
        });
        let extracted = join_all(extractions).await.into_iter().filter(|ok| *ok).count();

        info!(
            count = placed.len(),
            extracted,
            frame_source = self.frames.name(),
            "upload batch finished"
        );
        placed.len()
    }
}
