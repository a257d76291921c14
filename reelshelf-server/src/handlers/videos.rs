use axum::{
    extract::{Path, Query, State, rejection::JsonRejection},
    response::Json,
};
use reelshelf_core::{LibraryLayout, Theme, VideoAsset};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::infra::{app_state::AppState, errors::AppResult};

#[derive(Debug, Serialize)]
pub struct VideoListResponse {
    pub items: Vec<VideoAsset>,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RenameRequest {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SlateQuery {
    pub theme: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SlateResponse {
    pub ok: bool,
    #[serde(rename = "slateURL")]
    pub slate_url: String,
}

/// List every video with its title and best available thumbnail
pub async fn list_videos_handler(
    State(state): State<AppState>,
) -> AppResult<Json<VideoListResponse>> {
    let items = state.library().list().await?;
    debug!(count = items.len(), "listed videos");
    Ok(Json(VideoListResponse { items }))
}

/// Set a video's title. A missing or unreadable body counts as a missing
/// title and is rejected as such.
pub async fn rename_video_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request: Result<Json<RenameRequest>, JsonRejection>,
) -> AppResult<Json<OkResponse>> {
    let request = match request {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!(%id, reason = %rejection.body_text(), "unreadable rename body");
            RenameRequest::default()
        }
    };
    let title = request.title.unwrap_or_default();
    state.library().lifecycle().rename(&id, &title).await?;
    Ok(Json(OkResponse::ok()))
}

pub async fn delete_video_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<OkResponse>> {
    state.library().lifecycle().delete(&id).await?;
    Ok(Json(OkResponse::ok()))
}

/// Rewrite a video's slate, optionally in another theme. Unknown theme names
/// use the configured default.
pub async fn regenerate_slate_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<SlateQuery>,
) -> AppResult<Json<SlateResponse>> {
    let default_theme = state.config().slate.default_theme;
    let theme = query
        .theme
        .as_deref()
        .map(|name| Theme::parse_or(name, default_theme))
        .unwrap_or(default_theme);

    let file_name = state
        .library()
        .lifecycle()
        .regenerate_slate(&id, theme)
        .await?;

    Ok(Json(SlateResponse {
        ok: true,
        slate_url: LibraryLayout::public_url(&file_name),
    }))
}
