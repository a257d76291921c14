//! Write-then-rename helpers so readers never observe a half-written file.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Hidden sibling of `path` used as a staging file. The optional extension is
/// kept last so tools that pick an encoder from the name still work.
pub fn staging_path(path: &Path, extension: Option<&str>) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let token = uuid::Uuid::new_v4().simple();
    let staged = match extension {
        Some(ext) => format!(".{name}.{token}.tmp.{ext}"),
        None => format!(".{name}.{token}.tmp"),
    };
    path.with_file_name(staged)
}

/// Atomically replace `path` with `bytes`.
///
/// Strategy:
/// - Write to a hidden sibling in the same directory
/// - fsync the staged file
/// - Rename it over the destination (atomic on POSIX filesystems)
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let staged = staging_path(path, None);

    let result = async {
        let mut file = fs::File::create(&staged).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&staged, path).await
    }
    .await;

    if result.is_err() {
        let _ = fs::remove_file(&staged).await;
    }
    result
}

/// A file removed again when dropped, unless [`StagedFile::keep`] was called.
///
/// Dropping covers every way out of an upload: early returns, errors and a
/// request future cancelled mid-stream.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    keep: bool,
}

impl StagedFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path, keep: false }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Point the guard at `path` instead, returning the previous path. The
    /// caller is responsible for whatever now lives at the old one.
    pub fn retarget(&mut self, path: PathBuf) -> PathBuf {
        std::mem::replace(&mut self.path, path)
    }

    /// Leave the file in place from now on.
    pub fn keep(&mut self) {
        self.keep = true;
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.keep {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}
