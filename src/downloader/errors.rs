// Error types for the download pipeline

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable classification of every failure the pipeline can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidUrl,
    NoVideoFound,
    NoVideoContent,
    FormatNotFound,
    NoPlayableFormat,
    PrivateOrProtected,
    ContentNotFound,
    EngineFailure,
    InternalError,
}

impl ErrorKind {
    /// Short human label shown next to the message
    pub fn label(&self) -> &'static str {
        match self {
            Self::InvalidUrl => "Invalid Twitter URL format",
            Self::NoVideoFound => "No video found",
            Self::NoVideoContent => "No video content",
            Self::FormatNotFound => "Format not found",
            Self::NoPlayableFormat => "No playable format",
            Self::PrivateOrProtected => "Private account",
            Self::ContentNotFound => "Tweet not found",
            Self::EngineFailure => "Download error",
            Self::InternalError => "Unexpected error",
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum DownloadError {
    /// Input did not match any accepted post URL shape
    #[error("{0}")]
    InvalidUrl(String),

    /// Probe succeeded but returned nothing usable
    #[error("No video found at this URL")]
    NoVideoFound,

    /// Descriptor has no variant with a video track
    #[error("This tweet contains no video content")]
    NoVideoContent,

    #[error("Requested format '{0}' is not available")]
    FormatNotFound(String),

    #[error("No playable format available")]
    NoPlayableFormat,

    /// Engine reported an access restriction (original message kept)
    #[error("This tweet is from a private account")]
    PrivateOrProtected(String),

    /// Engine reported deletion or removal (original message kept)
    #[error("Tweet not found - it might have been deleted")]
    ContentNotFound(String),

    /// Any other engine failure, message verbatim
    #[error("{0}")]
    EngineFailure(String),

    #[error("{0}")]
    Internal(String),
}

impl DownloadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidUrl(_) => ErrorKind::InvalidUrl,
            Self::NoVideoFound => ErrorKind::NoVideoFound,
            Self::NoVideoContent => ErrorKind::NoVideoContent,
            Self::FormatNotFound(_) => ErrorKind::FormatNotFound,
            Self::NoPlayableFormat => ErrorKind::NoPlayableFormat,
            Self::PrivateOrProtected(_) => ErrorKind::PrivateOrProtected,
            Self::ContentNotFound(_) => ErrorKind::ContentNotFound,
            Self::EngineFailure(_) => ErrorKind::EngineFailure,
            Self::Internal(_) => ErrorKind::InternalError,
        }
    }

    /// Raw engine output behind a classified failure, if any
    pub fn engine_message(&self) -> Option<&str> {
        match self {
            Self::PrivateOrProtected(msg) | Self::ContentNotFound(msg) | Self::EngineFailure(msg) => {
                Some(msg)
            }
            _ => None,
        }
    }

    /// Classify an engine error message.
    ///
    /// The engine exposes no structured error codes, so this is a best-effort
    /// substring check. Anything unrecognised stays an `EngineFailure` with the
    /// message untouched.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        if lower.contains("private") || lower.contains("protected") {
            return Self::PrivateOrProtected(message);
        }

        if lower.contains("not found")
            || lower.contains("deleted")
            || lower.contains("no longer available")
        {
            return Self::ContentNotFound(message);
        }

        Self::EngineFailure(message)
    }
}

impl From<std::io::Error> for DownloadError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
