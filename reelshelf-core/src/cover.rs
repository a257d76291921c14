//! Custom cover ingestion.

use tracing::{info, warn};

use crate::error::{LibraryError, Result};
use crate::library::atomic::write_atomic;
use crate::library::{ArtifactKind, LibraryLayout};

pub const ALLOWED_COVER_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

pub const DEFAULT_MAX_COVER_BYTES: u64 = 10 * 1024 * 1024;

/// Lowercase a declared content type and drop any parameters.
pub fn normalize_mime(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Identify an allowed raster format from its magic bytes.
pub fn sniff_image_type(data: &[u8]) -> Option<&'static str> {
    // JPEG: FF D8 FF
    if data.len() >= 3 && data[..3] == [0xFF, 0xD8, 0xFF] {
        return Some("image/jpeg");
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if data.len() >= 8 && data[..8] == [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A] {
        return Some("image/png");
    }

    // WebP: RIFF....WEBP
    if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        return Some("image/webp");
    }

    None
}

#[derive(Debug, Clone)]
pub struct CoverIngestor {
    layout: LibraryLayout,
    max_cover_bytes: u64,
}

impl CoverIngestor {
    pub fn new(layout: LibraryLayout, max_cover_bytes: u64) -> Self {
        Self {
            layout,
            max_cover_bytes,
        }
    }

    /// Store `bytes` as the custom cover for `id`, replacing any earlier one.
    ///
    /// `mime` is the client-declared type. When present it must be on the
    /// allow-list; the bytes themselves must always sniff as an allowed
    /// format. Rejected input writes nothing, so an existing cover survives.
    /// Returns the cover's file name inside the library root.
    pub async fn ingest(&self, id: &str, bytes: &[u8], mime: Option<&str>) -> Result<String> {
        let source = self.layout.source_path(id)?;
        if !tokio::fs::try_exists(&source).await? {
            return Err(LibraryError::NotFound(id.to_string()));
        }

        if bytes.len() as u64 > self.max_cover_bytes {
            return Err(LibraryError::TooLarge {
                limit: self.max_cover_bytes,
            });
        }

        if let Some(declared) = mime {
            let declared = normalize_mime(declared);
            if !ALLOWED_COVER_TYPES.contains(&declared.as_str()) {
                return Err(LibraryError::UnsupportedMedia(format!(
                    "cover type {declared} is not accepted"
                )));
            }
        }

        let Some(detected) = sniff_image_type(bytes) else {
            warn!(
                %id,
                "rejected cover with unrecognized header: {:02X?}",
                &bytes[..8.min(bytes.len())]
            );
            return Err(LibraryError::UnsupportedMedia(
                "cover is not a JPEG, PNG or WebP image".to_string(),
            ));
        };

        let path = self.layout.artifact_path(id, ArtifactKind::CustomCover)?;
        write_atomic(&path, bytes).await?;

        info!(%id, format = detected, size = bytes.len(), "custom cover stored");
        Ok(ArtifactKind::CustomCover.file_name(id))
    }
}
