use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use crate::downloader::JobId;
use crate::web::error::ApiError;
use crate::web::routes::MediaRequest;
use crate::web::state::AppState;

/// Register a disk download and return its id right away. URL shape
/// problems surface on the job, not here.
pub(crate) async fn start_download(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let req = MediaRequest::from_body(&body)?;
    let url = req.url()?;
    let id = state
        .orchestrator
        .start(url, req.format_id().map(str::to_string));

    Ok(Json(json!({
        "success": true,
        "job_id": id,
        "progress_id": id,
        "message": "Download started",
    })))
}

pub(crate) async fn progress(State(state): State<AppState>, Path(id): Path<String>) -> Json<Value> {
    let id = JobId::new(id);
    match state.jobs().get(&id) {
        Some(snapshot) => Json(serde_json::to_value(snapshot).unwrap_or_else(|e| {
            json!({ "status": "error", "message": format!("snapshot encoding failed: {e}") })
        })),
        None => Json(json!({
            "status": "unknown",
            "percent": 0,
            "message": "Unknown progress ID",
        })),
    }
}
