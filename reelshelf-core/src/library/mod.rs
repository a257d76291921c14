//! On-disk layout of a video library.
//!
//! A library is one flat directory: source videos named by their id, a JSON
//! sidecar holding titles, and derived artifacts whose names are a pure
//! function of the id and the artifact kind. Nothing else is indexed.

pub mod atomic;
pub mod ids;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LibraryError, Result};

pub use ids::{IdGenerator, default_title, sanitize_file_name, title_from_original_name};

pub const DEFAULT_METADATA_FILE: &str = "metadata.json";

pub const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "webm", "mkv", "avi", "m4v"];

/// Kinds of derived thumbnail artifact, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    CustomCover,
    ExtractedFrame,
    Slate,
}

impl ArtifactKind {
    /// Every artifact kind in resolution priority order.
    pub const PRIORITY: [ArtifactKind; 3] = [
        ArtifactKind::CustomCover,
        ArtifactKind::ExtractedFrame,
        ArtifactKind::Slate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::CustomCover => "custom_cover",
            ArtifactKind::ExtractedFrame => "extracted_frame",
            ArtifactKind::Slate => "slate",
        }
    }

    /// Filename suffix appended to the id.
    pub fn suffix(self) -> &'static str {
        match self {
            ArtifactKind::CustomCover => ".cover.jpg",
            ArtifactKind::ExtractedFrame => ".jpg",
            ArtifactKind::Slate => ".svg",
        }
    }

    pub fn file_name(self, id: &str) -> String {
        format!("{id}{}", self.suffix())
    }
}

/// Path rules for a library rooted at one directory.
#[derive(Debug, Clone)]
pub struct LibraryLayout {
    root: PathBuf,
    metadata_file: String,
    video_extensions: Vec<String>,
}

impl LibraryLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            metadata_file: DEFAULT_METADATA_FILE.to_string(),
            video_extensions: DEFAULT_VIDEO_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }

    pub fn with_metadata_file(mut self, name: impl Into<String>) -> Self {
        self.metadata_file = name.into();
        self
    }

    /// Replace the video extension allow-list. Leading dots and case are
    /// normalised away.
    pub fn with_video_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.video_extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn metadata_file(&self) -> &str {
        &self.metadata_file
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.root.join(&self.metadata_file)
    }

    pub fn video_extensions(&self) -> &[String] {
        &self.video_extensions
    }

    /// Whether a directory entry named `name` is a source video.
    pub fn is_video_name(&self, name: &str) -> bool {
        if name == self.metadata_file {
            return false;
        }
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => self
                .video_extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext)),
            _ => false,
        }
    }

    /// Reject ids that could escape the library root or name something that
    /// is not a source video. Any other name a file can have in the root,
    /// spaces and non-ASCII included, is a valid id.
    pub fn validate_id<'a>(&self, id: &'a str) -> Result<&'a str> {
        let well_formed = !id.is_empty()
            && !id.starts_with('.')
            && !id.contains(['/', '\\', '\0']);

        if well_formed && self.is_video_name(id) {
            Ok(id)
        } else {
            Err(LibraryError::InvalidId(id.to_string()))
        }
    }

    pub fn source_path(&self, id: &str) -> Result<PathBuf> {
        let id = self.validate_id(id)?;
        Ok(self.root.join(id))
    }

    pub fn artifact_path(&self, id: &str, kind: ArtifactKind) -> Result<PathBuf> {
        let id = self.validate_id(id)?;
        Ok(self.root.join(kind.file_name(id)))
    }

    /// Public URL of a file that lives directly in the library root.
    pub fn public_url(file_name: &str) -> String {
        format!("/uploads/{}", urlencoding::encode(file_name))
    }

    pub async fn ensure_root(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }
}
