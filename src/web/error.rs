//! HTTP error type and the mapping from pipeline failures to status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::downloader::{DownloadError, ErrorKind};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error("File not found")]
    FileNotFound,

    #[error("Invalid file name")]
    InvalidFileName,
}

/// Failure payload: `{success: false, kind, error, message}`
#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<ErrorKind>,
    error: String,
    message: String,
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidUrl => StatusCode::BAD_REQUEST,
        ErrorKind::PrivateOrProtected => StatusCode::FORBIDDEN,
        ErrorKind::ContentNotFound | ErrorKind::FormatNotFound => StatusCode::NOT_FOUND,
        ErrorKind::NoVideoFound | ErrorKind::NoVideoContent | ErrorKind::NoPlayableFormat => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ErrorKind::EngineFailure => StatusCode::BAD_GATEWAY,
        ErrorKind::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Download(err) => {
                let kind = err.kind();
                (
                    status_for(kind),
                    ErrorBody {
                        success: false,
                        kind: Some(kind),
                        error: kind.label().to_string(),
                        message: err.to_string(),
                    },
                )
            }
            ApiError::FileNotFound => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    success: false,
                    kind: None,
                    error: self.to_string(),
                    message: self.to_string(),
                },
            ),
            ApiError::InvalidFileName => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    success: false,
                    kind: None,
                    error: self.to_string(),
                    message: "File names must not contain path separators".to_string(),
                },
            ),
        };

        (status, axum::Json(body)).into_response()
    }
}
