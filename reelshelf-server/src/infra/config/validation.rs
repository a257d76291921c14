use thiserror::Error;

use super::models::Config;

#[derive(Debug, Error)]
pub enum ConfigGuardRailError {
    #[error("max_cover_bytes must be greater than zero")]
    ZeroCoverLimit,
    #[error(
        "max_cover_bytes ({cover}) must be smaller than max_video_bytes ({video})"
    )]
    CoverLimitNotSmaller { cover: u64, video: u64 },
    #[error("ffmpeg frame_width must be a positive even number, got {0}")]
    InvalidFrameWidth(u32),
    #[error("library video_extensions must list at least one extension")]
    NoVideoExtensions,
    #[error("library metadata_file must be a plain file name, got '{0}'")]
    InvalidMetadataFile(String),
    #[error("CORS wildcard origins are not allowed when DEV_MODE is false")]
    DangerousCorsWildcard,
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }
}

pub fn apply_guard_rails(
    config: &Config,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    let mut warnings = ConfigWarnings::default();
    let library = &config.library;

    if library.max_cover_bytes == 0 {
        return Err(ConfigGuardRailError::ZeroCoverLimit);
    }
    if library.max_cover_bytes >= library.max_video_bytes {
        return Err(ConfigGuardRailError::CoverLimitNotSmaller {
            cover: library.max_cover_bytes,
            video: library.max_video_bytes,
        });
    }

    if library.video_extensions.is_empty() {
        return Err(ConfigGuardRailError::NoVideoExtensions);
    }

    let metadata_file = library.metadata_file.as_str();
    if metadata_file.is_empty()
        || metadata_file.contains(['/', '\\'])
        || metadata_file.starts_with('.')
    {
        return Err(ConfigGuardRailError::InvalidMetadataFile(
            metadata_file.to_string(),
        ));
    }

    let width = config.ffmpeg.frame_width;
    if width == 0 || width % 2 != 0 {
        return Err(ConfigGuardRailError::InvalidFrameWidth(width));
    }

    if !config.dev_mode && config.cors.is_wildcard_included() {
        return Err(ConfigGuardRailError::DangerousCorsWildcard);
    }

    if config.ffmpeg.disabled {
        warnings.push_with_hint(
            "Frame extraction disabled; every upload will show a generated slate",
            "Unset REELSHELF_DISABLE_FFMPEG to extract thumbnails from videos",
        );
    } else if config.ffmpeg.timeout.is_none() {
        warnings.push_with_hint(
            "ffmpeg timeout is off; a stalled extraction holds its upload response open",
            "Set ffmpeg.timeout (for example \"2m\") to bound extraction time",
        );
    }

    if config.dev_mode {
        warnings.push("DEV_MODE enabled; CORS accepts any origin");
    }

    Ok(warnings)
}
