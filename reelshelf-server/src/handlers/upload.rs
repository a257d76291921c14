use std::io;

use axum::{
    extract::{Multipart, State, multipart::MultipartError},
    response::Json,
};
use futures::TryStreamExt;
use reelshelf_core::LibraryError;
use serde::Serialize;
use tokio_util::io::StreamReader;
use tracing::{debug, warn};

use crate::infra::{
    app_state::AppState,
    errors::{AppError, AppResult},
};

/// Multipart field carrying video files.
pub const UPLOAD_FIELD: &str = "files";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub ok: bool,
    pub count: usize,
}

/// Accept a batch of videos and finish them before responding.
///
/// Files that are not videos are skipped. Any other failure fails the whole
/// batch; files already received for this request are dropped with it, as
/// they are when the client goes away mid-upload.
pub async fn upload_videos_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let uploads = state.library().uploads();
    let mut batch = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return Err(err.into()),
        };

        if field.name() != Some(UPLOAD_FIELD) {
            debug!(field = ?field.name(), "ignoring unexpected multipart field");
            continue;
        }
        let Some(file_name) = field.file_name().map(str::to_owned) else {
            debug!("ignoring upload field without a file name");
            continue;
        };

        let reader = StreamReader::new(field.map_err(io::Error::other));
        tokio::pin!(reader);

        match uploads.store_source(&file_name, reader).await {
            Ok(stored) => batch.push(stored),
            Err(LibraryError::UnsupportedMedia(reason)) => {
                warn!(file = %file_name, %reason, "skipping non-video upload");
            }
            Err(err) => return Err(upload_error(err)),
        }
    }

    let count = uploads.handle(batch).await;
    Ok(Json(UploadResponse { ok: true, count }))
}

/// Body-limit and stream errors surface as I/O errors from the copy; give
/// them back their multipart status.
fn upload_error(err: LibraryError) -> AppError {
    if let LibraryError::Io(io_err) = &err
        && let Some(multipart) = io_err
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<MultipartError>())
    {
        return AppError::new(multipart.status(), multipart.body_text());
    }
    err.into()
}
