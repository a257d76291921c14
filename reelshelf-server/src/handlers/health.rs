use axum::{extract::State, response::Json};
use serde_json::{Value, json};

use crate::infra::app_state::AppState;

pub async fn ping_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "frameSource": state.library().frame_source_name(),
    }))
}
