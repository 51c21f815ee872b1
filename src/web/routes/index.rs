use axum::Json;
use serde_json::{json, Value};

pub(crate) async fn index() -> Json<Value> {
    Json(json!({
        "message": "Twitter Video Downloader API",
        "status": "running",
    }))
}
