use std::path::{Path, PathBuf};
use std::time::Duration;

use reelshelf_core::{FrameSettings, LibrarySettings, Theme};

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub library: LibraryConfig,
    pub slate: SlateConfig,
    pub ffmpeg: FfmpegConfig,
    pub cors: CorsConfig,
    pub dev_mode: bool,
    pub metadata: ConfigMetadata,
}

impl Config {
    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.library.root)?;
        Ok(())
    }

    pub fn normalize_paths(&mut self) -> anyhow::Result<()> {
        self.library.root = std::fs::canonicalize(&self.library.root)?;
        Ok(())
    }

    pub fn library_root(&self) -> &Path {
        &self.library.root
    }

    pub fn library_settings(&self) -> LibrarySettings {
        LibrarySettings {
            root: self.library.root.clone(),
            metadata_file: self.library.metadata_file.clone(),
            video_extensions: self.library.video_extensions.clone(),
            max_video_bytes: self.library.max_video_bytes,
            max_cover_bytes: self.library.max_cover_bytes,
            brand: self.slate.brand.clone(),
            fallback_title: self.slate.fallback_title.clone(),
            default_theme: self.slate.default_theme,
        }
    }

    pub fn frame_settings(&self) -> FrameSettings {
        FrameSettings {
            program: self.ffmpeg.path.clone(),
            seek_seconds: self.ffmpeg.seek_seconds,
            frame_width: self.ffmpeg.frame_width,
            timeout: self.ffmpeg.timeout,
            disabled: self.ffmpeg.disabled,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct LibraryConfig {
    pub root: PathBuf,
    pub metadata_file: String,
    pub video_extensions: Vec<String>,
    pub max_video_bytes: u64,
    pub max_cover_bytes: u64,
}

#[derive(Debug, Clone)]
pub struct SlateConfig {
    pub brand: String,
    pub default_theme: Theme,
    pub fallback_title: String,
}

#[derive(Debug, Clone)]
pub struct FfmpegConfig {
    pub path: PathBuf,
    pub seek_seconds: u32,
    pub frame_width: u32,
    /// `None` lets an extraction run for as long as ffmpeg takes.
    pub timeout: Option<Duration>,
    pub disabled: bool,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn is_wildcard_included(&self) -> bool {
        self.allowed_origins
            .iter()
            .any(|origin| origin.trim() == "*")
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}
