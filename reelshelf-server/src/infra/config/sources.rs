use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub library: FileLibraryConfig,
    #[serde(default)]
    pub slate: FileSlateConfig,
    #[serde(default)]
    pub ffmpeg: FileFfmpegConfig,
    #[serde(default)]
    pub cors: FileCorsConfig,
    pub dev_mode: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileLibraryConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_extensions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_video_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_cover_bytes: Option<u64>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileSlateConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_title: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileFfmpegConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seek_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_width: Option<u32>,
    /// Humantime string such as `"90s"` or `"2m"`; `"off"` disables it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileCorsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_origins: Option<Vec<String>>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub library_root: Option<PathBuf>,
    pub max_video_bytes: Option<u64>,
    pub max_cover_bytes: Option<u64>,
    pub ffmpeg_path: Option<PathBuf>,
    pub ffmpeg_timeout: Option<String>,
    pub ffmpeg_disabled: Option<bool>,
    pub cors_allowed_origins: Option<Vec<String>>,
    pub dev_mode: Option<bool>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        let mut env_config = Self::default();

        env_config.config_path =
            std::env::var("REELSHELF_CONFIG").ok().map(PathBuf::from);
        env_config.server_host = std::env::var("SERVER_HOST").ok();
        // PORT is what the original single-binary deployment read.
        env_config.server_port = parse_var("SERVER_PORT").or_else(|| parse_var("PORT"));
        env_config.library_root =
            std::env::var("LIBRARY_ROOT").ok().map(PathBuf::from);
        env_config.max_video_bytes = parse_var("MAX_VIDEO_BYTES");
        env_config.max_cover_bytes = parse_var("MAX_COVER_BYTES");
        env_config.ffmpeg_path = std::env::var("FFMPEG_PATH").ok().map(PathBuf::from);
        env_config.ffmpeg_timeout = std::env::var("FFMPEG_TIMEOUT").ok();
        env_config.ffmpeg_disabled = parse_bool_var("REELSHELF_DISABLE_FFMPEG");

        env_config.cors_allowed_origins = parse_csv_var("CORS_ALLOWED_ORIGINS");
        env_config.dev_mode = parse_bool_var("DEV_MODE");

        env_config
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

fn parse_csv_var(name: &str) -> Option<Vec<String>> {
    std::env::var(name).ok().map(|raw| {
        raw.split(',')
            .filter_map(|part| {
                let trimmed = part.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .collect()
    })
}

fn parse_bool_var(name: &str) -> Option<bool> {
    std::env::var(name).ok().and_then(|raw| parse_bool(&raw))
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_values_accept_common_spellings() {
        assert_eq!(parse_bool("YES"), Some(true));
        assert_eq!(parse_bool(" 0 "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn toml_sections_are_optional() {
        let parsed: FileConfig = toml::from_str(
            r#"
            dev_mode = true

            [library]
            root = "/srv/videos"
            video_extensions = ["mp4"]

            [ffmpeg]
            timeout = "45s"
            "#,
        )
        .expect("parse");

        assert_eq!(parsed.dev_mode, Some(true));
        assert_eq!(parsed.library.root, Some(PathBuf::from("/srv/videos")));
        assert_eq!(parsed.ffmpeg.timeout.as_deref(), Some("45s"));
        assert!(parsed.server.port.is_none());
        assert!(parsed.slate.brand.is_none());
    }
}
