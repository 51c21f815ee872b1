use std::path::Path as FsPath;
use std::time::UNIX_EPOCH;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use tokio_util::io::ReaderStream;

use crate::downloader::streaming::content_type_for;
use crate::web::error::ApiError;
use crate::web::state::AppState;

#[derive(Debug, Serialize)]
struct StoredFile {
    name: String,
    size: u64,
    /// Seconds since the Unix epoch
    modified: Option<f64>,
}

/// RFC 5987 `attr-char`; every other byte is percent-encoded
fn is_attr_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&b)
}

/// Quoted-string name for clients that ignore `filename*`. Each run of
/// unrepresentable characters becomes a single `_`.
fn ascii_fallback(filename: &str) -> String {
    let mut out = String::with_capacity(filename.len());
    let mut replacing = false;
    for c in filename.chars() {
        if (c.is_ascii_graphic() || c == ' ') && c != '"' && c != '\\' {
            out.push(c);
            replacing = false;
        } else if !replacing {
            out.push('_');
            replacing = true;
        }
    }
    out
}

/// `attachment` disposition. Names that survive the ASCII fallback go out
/// as-is; anything else also carries a UTF-8 `filename*`.
pub(crate) fn content_disposition(filename: &str) -> Option<HeaderValue> {
    let fallback = ascii_fallback(filename);
    let value = if fallback == filename {
        format!("attachment; filename=\"{}\"", filename)
    } else {
        let encoded: String = filename
            .bytes()
            .map(|b| {
                if is_attr_char(b) {
                    char::from(b).to_string()
                } else {
                    format!("%{b:02X}")
                }
            })
            .collect();
        format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
    };
    HeaderValue::from_str(&value).ok()
}

pub(crate) async fn list_downloads(State(state): State<AppState>) -> Json<Value> {
    let dir = state.output_dir.to_path_buf();
    let files = tokio::task::spawn_blocking(move || scan_dir(&dir))
        .await
        .unwrap_or_default();
    Json(json!({ "files": files }))
}

fn scan_dir(dir: &FsPath) -> Vec<StoredFile> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files: Vec<StoredFile> = entries
        .flatten()
        .filter_map(|entry| {
            let meta = entry.metadata().ok()?;
            if !meta.is_file() {
                return None;
            }
            let modified = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_secs_f64());
            Some(StoredFile {
                name: entry.file_name().to_string_lossy().into_owned(),
                size: meta.len(),
                modified,
            })
        })
        .collect();
    files.sort_by(|a, b| a.name.cmp(&b.name));
    files
}

/// Send one stored file. Only plain names inside the output directory.
pub(crate) async fn download_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    if filename.is_empty()
        || filename.contains(['/', '\\'])
        || filename == "."
        || filename == ".."
    {
        return Err(ApiError::InvalidFileName);
    }

    let base: &FsPath = &state.output_dir;
    let base_canon = tokio::fs::canonicalize(base)
        .await
        .map_err(|_| ApiError::FileNotFound)?;
    let target = tokio::fs::canonicalize(base.join(&filename))
        .await
        .map_err(|_| ApiError::FileNotFound)?;
    if !target.starts_with(&base_canon) {
        // symlink pointing outside the output directory
        return Err(ApiError::InvalidFileName);
    }

    let meta = tokio::fs::metadata(&target)
        .await
        .map_err(|_| ApiError::FileNotFound)?;
    if !meta.is_file() {
        return Err(ApiError::FileNotFound);
    }

    let ext = target
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    let file = tokio::fs::File::open(&target)
        .await
        .map_err(|_| ApiError::FileNotFound)?;

    let mut resp = Response::new(Body::from_stream(ReaderStream::new(file)));
    *resp.status_mut() = StatusCode::OK;
    resp.headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type_for(ext)));
    resp.headers_mut()
        .insert(header::CONTENT_LENGTH, HeaderValue::from(meta.len()));
    if let Some(value) = content_disposition(&filename) {
        resp.headers_mut().insert(header::CONTENT_DISPOSITION, value);
    }

    Ok(resp)
}
