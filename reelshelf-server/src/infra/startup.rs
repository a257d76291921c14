use std::sync::Arc;

use anyhow::{Context, Result};
use reelshelf_core::{FrameSource, LibraryService, probe_frame_source};
use tracing::info;

use crate::infra::{app_state::AppState, config::Config};

/// Probe for a frame source and open the library described by `config`.
pub async fn wire_app_state(config: Arc<Config>) -> Result<AppState> {
    let frames = probe_frame_source(config.frame_settings()).await;
    wire_app_state_with_frames(config, frames).await
}

/// Like [`wire_app_state`] with an already chosen frame source.
pub async fn wire_app_state_with_frames(
    config: Arc<Config>,
    frames: Arc<dyn FrameSource>,
) -> Result<AppState> {
    let library = LibraryService::open(&config.library_settings(), frames)
        .await
        .with_context(|| {
            format!(
                "failed to open video library at {}",
                config.library.root.display()
            )
        })?;

    info!(
        root = %config.library.root.display(),
        frame_source = library.frame_source_name(),
        theme = %config.slate.default_theme,
        "video library ready"
    );

    Ok(AppState::new(Arc::new(library), config))
}
