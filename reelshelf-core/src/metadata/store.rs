//! Single-writer owner of the metadata sidecar.
//!
//! All mutations are sent to one task over a channel and applied in arrival
//! order, each as load-modify-save. Two concurrent renames therefore can no
//! longer drop each other's update. Reads go straight to the file: saves are
//! atomic renames, so a reader sees either the old or the new mapping.
//!
//! A title is only ever written for a source that exists when the write is
//! applied. A delete removes the source before it queues its record removal,
//! so a rename racing it either lands first and is then removed, or finds the
//! source gone.

use std::path::{Path, PathBuf};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::{MetadataDocument, MetadataFile, MetadataRecord};
use crate::error::{LibraryError, Result};

const COMMAND_BUFFER: usize = 64;

#[derive(Debug)]
enum StoreCommand {
    InsertMissing {
        entries: Vec<(String, String)>,
        reply: oneshot::Sender<Result<usize>>,
    },
    SetTitle {
        id: String,
        title: String,
        source: PathBuf,
        reply: oneshot::Sender<Result<()>>,
    },
    Remove {
        id: String,
        reply: oneshot::Sender<Result<bool>>,
    },
}

#[derive(Debug, Clone)]
pub struct MetadataStore {
    file: MetadataFile,
    command_tx: mpsc::Sender<StoreCommand>,
}

impl MetadataStore {
    /// Start the owning task. Must be called from within a tokio runtime.
    pub fn spawn(file: MetadataFile) -> Self {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        tokio::spawn(run(file.clone(), command_rx));
        Self { file, command_tx }
    }

    pub fn file(&self) -> &MetadataFile {
        &self.file
    }

    /// Current mapping as stored on disk.
    pub async fn snapshot(&self) -> MetadataDocument {
        self.file.load().await
    }

    pub async fn title(&self, id: &str) -> Option<String> {
        self.snapshot().await.title(id).map(str::to_string)
    }

    /// Record `(id, title)` pairs that have no entry yet, with a single save.
    /// Existing titles are never overwritten. Returns how many were added.
    pub async fn insert_missing(&self, entries: Vec<(String, String)>) -> Result<usize> {
        self.request(|reply| StoreCommand::InsertMissing { entries, reply })
            .await?
    }

    /// Set the title of `id`, whose source file lives at `source`. Fails with
    /// [`LibraryError::NotFound`] when the source is gone by the time the
    /// write is applied.
    pub async fn set_title(&self, id: &str, title: &str, source: &Path) -> Result<()> {
        let (id, title, source) = (id.to_string(), title.to_string(), source.to_path_buf());
        self.request(|reply| StoreCommand::SetTitle {
            id,
            title,
            source,
            reply,
        })
        .await?
    }

    /// Drop the record for `id`. Returns whether one existed.
    pub async fn remove(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.request(|reply| StoreCommand::Remove { id, reply }).await?
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> StoreCommand,
    ) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| LibraryError::StoreClosed)?;
        reply_rx.await.map_err(|_| LibraryError::StoreClosed)
    }
}

async fn run(file: MetadataFile, mut command_rx: mpsc::Receiver<StoreCommand>) {
    info!(path = %file.path().display(), "metadata store started");

    while let Some(command) = command_rx.recv().await {
        match command {
            StoreCommand::InsertMissing { entries, reply } => {
                let _ = reply.send(insert_missing(&file, entries).await);
            }
            StoreCommand::SetTitle {
                id,
                title,
                source,
                reply,
            } => {
                let _ = reply.send(set_title(&file, id, title, &source).await);
            }
            StoreCommand::Remove { id, reply } => {
                let _ = reply.send(remove(&file, &id).await);
            }
        }
    }

    debug!("metadata store stopped");
}

async fn insert_missing(file: &MetadataFile, entries: Vec<(String, String)>) -> Result<usize> {
    let mut doc = file.load().await;
    let mut added = 0;
    for (id, title) in entries {
        if !doc.items.contains_key(&id) {
            doc.items.insert(id, MetadataRecord::new(title));
            added += 1;
        }
    }
    if added > 0 {
        file.save(&doc).await?;
    }
    Ok(added)
}

async fn set_title(file: &MetadataFile, id: String, title: String, source: &Path) -> Result<()> {
    match tokio::fs::metadata(source).await {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => return Err(LibraryError::NotFound(id)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(LibraryError::NotFound(id));
        }
        Err(err) => return Err(err.into()),
    }
    let mut doc = file.load().await;
    doc.items.entry(id).or_default().title = title;
    file.save(&doc).await
}

async fn remove(file: &MetadataFile, id: &str) -> Result<bool> {
    let mut doc = file.load().await;
    if doc.items.remove(id).is_none() {
        return Ok(false);
    }
    if let Err(err) = file.save(&doc).await {
        warn!(id, error = %err, "failed to persist metadata removal");
        return Err(err);
    }
    Ok(true)
}
