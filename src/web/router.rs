use axum::extract::connect_info::ConnectInfo;
use axum::http::Request;
use axum::middleware::{from_fn, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::info;

use super::routes;
use super::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::index::index))
        .route("/video_info", post(routes::video_info::video_info))
        .route("/download", post(routes::jobs::start_download))
        .route("/progress/:id", get(routes::jobs::progress))
        .route("/stream_download", post(routes::stream::stream_download))
        .route("/downloads", get(routes::files::list_downloads))
        .route("/download_file/:filename", get(routes::files::download_file))
        .layer(from_fn(access_log_mw))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn access_log_mw(req: Request<axum::body::Body>, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let method = req.method().to_string();
    let ip = req
        .extensions()
        .get::<ConnectInfo<std::net::SocketAddr>>()
        .map(|c| c.0.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let started = std::time::Instant::now();
    let resp = next.run(req).await;
    info!(
        target: "web_access",
        ip = %ip,
        method = %method,
        path = %path,
        status = resp.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    resp
}
