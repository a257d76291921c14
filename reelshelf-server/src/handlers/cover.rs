use axum::{
    extract::{Multipart, Path, State},
    response::Json,
};
use reelshelf_core::LibraryLayout;
use serde::Serialize;

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};

/// Multipart field carrying the cover image.
pub const COVER_FIELD: &str = "cover";

#[derive(Debug, Serialize)]
pub struct CoverResponse {
    pub ok: bool,
    #[serde(rename = "coverURL")]
    pub cover_url: String,
}

pub async fn upload_cover_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> AppResult<Json<CoverResponse>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(COVER_FIELD) {
            continue;
        }

        let mime = field.content_type().map(str::to_owned);
        let bytes = field.bytes().await?;

        let file_name = state
            .library()
            .covers()
            .ingest(&id, &bytes, mime.as_deref())
            .await?;

        return Ok(Json(CoverResponse {
            ok: true,
            cover_url: LibraryLayout::public_url(&file_name),
        }));
    }

    Err(AppError::bad_request(format!(
        "multipart field '{COVER_FIELD}' is required"
    )))
}
