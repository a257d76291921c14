use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum_test::TestServer;
use reelshelf_core::{FrameSource, Theme, UnavailableFrameSource};
use reelshelf_server::{
    AppState,
    infra::{
        config::{
            Config, ConfigMetadata, CorsConfig, FfmpegConfig, LibraryConfig,
            ServerConfig, SlateConfig,
        },
        startup::wire_app_state_with_frames,
    },
    routes::create_app,
};
use tempfile::TempDir;

// Code is used by test modules, but not in this scope
#[allow(unused)]
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    _tempdir: TempDir,
}

#[allow(unused)]
impl TestApp {
    pub fn library_root(&self) -> PathBuf {
        self.state.config().library.root.clone()
    }
}

#[allow(unused)]
pub fn test_config(root: PathBuf) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
        },
        library: LibraryConfig {
            root,
            metadata_file: "metadata.json".into(),
            video_extensions: ["mp4", "mov", "webm", "mkv", "avi", "m4v"]
                .into_iter()
                .map(String::from)
                .collect(),
            max_video_bytes: 1024 * 1024,
            max_cover_bytes: 64 * 1024,
        },
        slate: SlateConfig {
            brand: "Reelshelf".into(),
            default_theme: Theme::Midnight,
            fallback_title: "Untitled video".into(),
        },
        ffmpeg: FfmpegConfig {
            path: PathBuf::from("ffmpeg"),
            seek_seconds: 3,
            frame_width: 640,
            timeout: Some(Duration::from_secs(5)),
            disabled: true,
        },
        cors: CorsConfig {
            allowed_origins: vec![],
        },
        dev_mode: true,
        metadata: ConfigMetadata::default(),
    }
}

#[allow(unused)]
pub async fn build_test_app_with(
    frames: Arc<dyn FrameSource>,
    customize: impl FnOnce(&mut Config),
) -> Result<TestApp> {
    let tempdir =
        tempfile::tempdir().context("failed to create temporary directory")?;
    let mut config = test_config(tempdir.path().join("uploads"));
    customize(&mut config);

    let state = wire_app_state_with_frames(Arc::new(config), frames).await?;
    let server = TestServer::new(create_app(state.clone()))
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;

    Ok(TestApp {
        server,
        state,
        _tempdir: tempdir,
    })
}

#[allow(unused)]
pub async fn build_test_app() -> Result<TestApp> {
    build_test_app_with(Arc::new(UnavailableFrameSource), |_| {}).await
}
