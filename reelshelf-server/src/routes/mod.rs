use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{Method, header},
    routing::{get, patch, post},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{AppState, handlers, infra::config::Config};

/// Slack on top of the payload caps for multipart boundaries and headers.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// Create the API router mounted under `/api`
pub fn create_api_router(state: AppState) -> Router<AppState> {
    let cover_limit = body_limit(state.config().library.max_cover_bytes);

    let api = Router::new()
        .route("/videos", get(handlers::list_videos_handler))
        .route(
            "/videos/{id}",
            patch(handlers::rename_video_handler).delete(handlers::delete_video_handler),
        )
        .route(
            "/videos/{id}/slate",
            post(handlers::regenerate_slate_handler),
        )
        .route(
            "/videos/{id}/cover",
            post(handlers::upload_cover_handler).layer(DefaultBodyLimit::max(cover_limit)),
        )
        // max_video_bytes caps each file while it streams, not the batch
        .route(
            "/upload",
            post(handlers::upload_videos_handler).layer(DefaultBodyLimit::disable()),
        );

    Router::new().nest("/api", api)
}

/// Full application: API, static library files, liveness and middleware
pub fn create_app(state: AppState) -> Router {
    let cors_layer = build_cors_layer(state.config());
    let library_files = ServeDir::new(state.config().library_root());

    Router::new()
        .route("/ping", get(handlers::ping_handler))
        .merge(create_api_router(state.clone()))
        .nest_service("/uploads", library_files)
        // CORS outermost, then tracing
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn body_limit(payload_cap: u64) -> usize {
    usize::try_from(payload_cap.saturating_add(MULTIPART_OVERHEAD)).unwrap_or(usize::MAX)
}

/// Permissive in dev, allow-list otherwise
fn build_cors_layer(config: &Config) -> CorsLayer {
    if config.dev_mode {
        return CorsLayer::permissive();
    }

    let origins: Vec<axum::http::HeaderValue> = config
        .cors
        .allowed_origins
        .iter()
        .filter_map(|s| axum::http::HeaderValue::from_str(s).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
}
