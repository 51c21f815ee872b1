use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;

use crate::web::error::ApiError;
use crate::web::routes::files::content_disposition;
use crate::web::routes::MediaRequest;
use crate::web::state::AppState;

/// Pipe the engine's output straight into the response body. Every failure
/// up to variant selection is a JSON payload; later ones cut the body short.
pub(crate) async fn stream_download(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let req = MediaRequest::from_body(&body)?;
    let url = req.url()?;
    let prepared = state.streaming.prepare(url, req.format_id()).await?;
    let stream = state.streaming.open(&prepared);

    let mut resp = Response::new(Body::from_stream(stream));
    *resp.status_mut() = StatusCode::OK;
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(prepared.content_type),
    );
    if let Some(value) = content_disposition(&prepared.filename) {
        resp.headers_mut().insert(header::CONTENT_DISPOSITION, value);
    }

    Ok(resp)
}
