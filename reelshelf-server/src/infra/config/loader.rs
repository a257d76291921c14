use once_cell::sync::Lazy;
use std::{fs, path::PathBuf, time::Duration};
use thiserror::Error;

use reelshelf_core::Theme;
use reelshelf_core::library::{DEFAULT_METADATA_FILE, DEFAULT_VIDEO_EXTENSIONS};
use reelshelf_core::service::DEFAULT_MAX_VIDEO_BYTES;
use reelshelf_core::cover::DEFAULT_MAX_COVER_BYTES;
use reelshelf_core::slate::{DEFAULT_BRAND, DEFAULT_FALLBACK_TITLE};

use super::{
    models::{
        Config, ConfigMetadata, CorsConfig, FfmpegConfig, LibraryConfig,
        ServerConfig, SlateConfig,
    },
    sources::{EnvConfig, FileConfig},
    validation::{self, ConfigGuardRailError, ConfigWarnings},
};

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("reelshelf.toml"),
        PathBuf::from("config/reelshelf.toml"),
    ]
});

const DEFAULT_FFMPEG_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Default, Clone)]
struct ConfigLoaderOptions {
    config_path: Option<PathBuf>,
    env_file: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    /// Load environment variables from `path` instead of `./.env`. Unlike
    /// the default location, a named file has to exist.
    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = self.load_env_file()?;

        let env_config = EnvConfig::gather();

        let (file_config, config_path) = self.load_file_config(&env_config)?;

        let (config, warnings) = compose_config(
            file_config,
            env_config,
            ConfigMetadata {
                config_path,
                env_file_loaded,
            },
        )?;

        Ok(ConfigLoad { config, warnings })
    }

    fn load_env_file(&self) -> Result<bool, ConfigLoadError> {
        match &self.options.env_file {
            Some(path) => {
                dotenvy::from_path(path)?;
                Ok(true)
            }
            None => dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                dotenvy::Error::Io(_) => Ok(false),
                _ => Err(err.into()),
            }),
        }
    }

    fn load_file_config(
        &self,
        env_config: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let mut source = ConfigPathSource::default();

        if let Some(explicit) = &self.options.config_path {
            source.explicit = Some(explicit.clone());
        } else if let Some(from_env) = &env_config.config_path {
            source.env = Some(from_env.clone());
        }

        if source.is_empty() {
            source.default = DEFAULT_CONFIG_LOCATIONS
                .iter()
                .find(|candidate| candidate.exists())
                .cloned();
        }

        let Some((path, provenance)) = source.resolved_path() else {
            return Ok((None, None));
        };

        if !path.exists() {
            if provenance.is_explicit() {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok((None, None));
        }

        let contents = fs::read_to_string(&path).map_err(|err| {
            ConfigLoadError::Io {
                path: path.clone(),
                source: err,
            }
        })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|err| ConfigLoadError::Parse {
                path: path.clone(),
                source: err,
            })?;

        Ok((Some(file_config), Some(path)))
    }
}

/// Merge file and environment values over the defaults, then create the
/// library root and apply guard rails.
pub fn compose_config(
    file_config: Option<FileConfig>,
    env: EnvConfig,
    metadata: ConfigMetadata,
) -> Result<(Config, ConfigWarnings), ConfigLoadError> {
    let mut warnings = ConfigWarnings::default();

    if metadata.config_path.is_none() {
        warnings.push_with_hint(
            "No reelshelf.toml detected; using environment variables and defaults",
            "Create reelshelf.toml or pass --config to customise slates and limits",
        );
    }

    let FileConfig {
        server: file_server,
        library: file_library,
        slate: file_slate,
        ffmpeg: file_ffmpeg,
        cors: file_cors,
        dev_mode: file_dev_mode,
    } = file_config.unwrap_or_default();

    let server = ServerConfig {
        host: env
            .server_host
            .or(file_server.host)
            .unwrap_or_else(|| "0.0.0.0".to_string()),
        port: env.server_port.or(file_server.port).unwrap_or(3000),
    };

    let library = LibraryConfig {
        root: env
            .library_root
            .or(file_library.root)
            .unwrap_or_else(|| PathBuf::from("./uploads")),
        metadata_file: file_library
            .metadata_file
            .unwrap_or_else(|| DEFAULT_METADATA_FILE.to_string()),
        video_extensions: file_library
            .video_extensions
            .unwrap_or_else(|| {
                DEFAULT_VIDEO_EXTENSIONS
                    .iter()
                    .map(|ext| ext.to_string())
                    .collect()
            })
            .into_iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect(),
        max_video_bytes: env
            .max_video_bytes
            .or(file_library.max_video_bytes)
            .unwrap_or(DEFAULT_MAX_VIDEO_BYTES),
        max_cover_bytes: env
            .max_cover_bytes
            .or(file_library.max_cover_bytes)
            .unwrap_or(DEFAULT_MAX_COVER_BYTES),
    };

    let default_theme = match file_slate.default_theme {
        Some(name) => Theme::lookup(&name).unwrap_or_else(|| {
            let theme = Theme::default();
            warnings.push(format!("Unknown slate theme '{name}'; using '{theme}'"));
            theme
        }),
        None => Theme::default(),
    };
    let slate = SlateConfig {
        brand: file_slate
            .brand
            .unwrap_or_else(|| DEFAULT_BRAND.to_string()),
        default_theme,
        fallback_title: file_slate
            .fallback_title
            .unwrap_or_else(|| DEFAULT_FALLBACK_TITLE.to_string()),
    };

    let timeout = match env.ffmpeg_timeout.or(file_ffmpeg.timeout) {
        Some(raw) => parse_timeout(&raw)?,
        None => Some(DEFAULT_FFMPEG_TIMEOUT),
    };
    let ffmpeg = FfmpegConfig {
        path: env
            .ffmpeg_path
            .or(file_ffmpeg.path)
            .unwrap_or_else(|| PathBuf::from("ffmpeg")),
        seek_seconds: file_ffmpeg.seek_seconds.unwrap_or(3),
        frame_width: file_ffmpeg.frame_width.unwrap_or(640),
        timeout,
        disabled: env
            .ffmpeg_disabled
            .or(file_ffmpeg.disabled)
            .unwrap_or(false),
    };

    let cors = CorsConfig {
        allowed_origins: env
            .cors_allowed_origins
            .or(file_cors.allowed_origins)
            .unwrap_or_else(default_cors_origins),
    };

    let dev_mode = env.dev_mode.or(file_dev_mode).unwrap_or(false);

    let mut config = Config {
        server,
        library,
        slate,
        ffmpeg,
        cors,
        dev_mode,
        metadata,
    };

    let guard_warnings = validation::apply_guard_rails(&config)?;
    warnings.extend(guard_warnings);

    config
        .ensure_directories()
        .map_err(|err| ConfigLoadError::Filesystem { source: err })?;
    config
        .normalize_paths()
        .map_err(|err| ConfigLoadError::Filesystem { source: err })?;

    Ok((config, warnings))
}

/// Humantime duration, or one of `off`/`none`/`0` for no timeout.
fn parse_timeout(raw: &str) -> Result<Option<Duration>, ConfigLoadError> {
    let trimmed = raw.trim();
    if matches!(trimmed.to_ascii_lowercase().as_str(), "off" | "none" | "0") {
        return Ok(None);
    }
    humantime::parse_duration(trimmed)
        .map(Some)
        .map_err(|source| ConfigLoadError::InvalidDuration {
            field: "ffmpeg.timeout",
            value: raw.to_string(),
            source,
        })
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid duration for {field}: '{value}'")]
    InvalidDuration {
        field: &'static str,
        value: String,
        #[source]
        source: humantime::DurationError,
    },
    #[error("filesystem initialization failed")]
    Filesystem { source: anyhow::Error },
    #[error(transparent)]
    GuardRail(#[from] ConfigGuardRailError),
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

#[derive(Debug, Default)]
struct ConfigPathSource {
    explicit: Option<PathBuf>,
    env: Option<PathBuf>,
    default: Option<PathBuf>,
}

impl ConfigPathSource {
    fn is_empty(&self) -> bool {
        self.explicit.is_none() && self.env.is_none() && self.default.is_none()
    }

    fn resolved_path(&self) -> Option<(PathBuf, ConfigPathProvenance)> {
        if let Some(path) = &self.explicit {
            return Some((path.clone(), ConfigPathProvenance::Explicit));
        }
        if let Some(path) = &self.env {
            return Some((path.clone(), ConfigPathProvenance::Env));
        }
        if let Some(path) = &self.default {
            return Some((path.clone(), ConfigPathProvenance::Default));
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigPathProvenance {
    Explicit,
    Env,
    Default,
}

impl ConfigPathProvenance {
    fn is_explicit(self) -> bool {
        matches!(
            self,
            ConfigPathProvenance::Explicit | ConfigPathProvenance::Env
        )
    }
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
    ]
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}
