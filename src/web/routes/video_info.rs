use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::downloader::{probe_video, url_validator, FormatSelector, FormatVariant};
use crate::web::error::ApiError;
use crate::web::routes::MediaRequest;
use crate::web::state::AppState;

/// One ranked variant as shown to clients
#[derive(Debug, Serialize)]
struct FormatView {
    format_id: String,
    ext: String,
    quality: String,
    resolution: String,
    width: Option<u32>,
    height: Option<u32>,
    fps: Option<f32>,
    filesize: Option<u64>,
    filesize_approx: Option<u64>,
    tbr: Option<f32>,
    vbr: Option<f32>,
}

impl From<&FormatVariant> for FormatView {
    fn from(f: &FormatVariant) -> Self {
        Self {
            format_id: f.format_id.clone(),
            ext: if f.ext.is_empty() { "mp4".to_string() } else { f.ext.clone() },
            quality: f.quality_label(),
            resolution: f.resolution_label(),
            width: f.width,
            height: f.height,
            fps: f.fps,
            filesize: f.filesize,
            filesize_approx: f.filesize_approx,
            tbr: f.tbr,
            vbr: f.vbr,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct VideoInfoResponse {
    success: bool,
    id: String,
    title: String,
    uploader: String,
    duration: Option<f64>,
    thumbnail: Option<String>,
    formats: Vec<FormatView>,
}

pub(crate) async fn video_info(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<VideoInfoResponse>, ApiError> {
    let req = MediaRequest::from_body(&body)?;
    let url = req.url()?;
    url_validator::validate(url)?;

    let engine = state.orchestrator.engine();
    let info = probe_video(engine.as_ref(), url).await?;
    let formats = FormatSelector::rank(&info.formats)
        .into_iter()
        .map(FormatView::from)
        .collect();

    Ok(Json(VideoInfoResponse {
        success: true,
        id: info.id.clone(),
        title: info.title.clone(),
        uploader: info.uploader.clone(),
        duration: info.duration,
        thumbnail: info.thumbnail.clone(),
        formats,
    }))
}
