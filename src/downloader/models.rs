// Common data models for the downloader

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use super::errors::{DownloadError, ErrorKind};

/// Metadata returned by a probe. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaDescriptor {
    /// Engine-side post identifier
    pub id: String,
    pub title: String,
    pub uploader: String,
    /// Duration in seconds
    pub duration: Option<f64>,
    pub thumbnail: Option<String>,
    /// Variants in engine discovery order
    pub formats: Vec<FormatVariant>,
}

/// One concrete encoded rendition of a media item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormatVariant {
    /// Format ID (unique within one descriptor)
    pub format_id: String,
    /// Container extension (mp4, webm, m4a)
    pub ext: String,
    /// Format note (e.g. "720p", "hls-2176")
    pub quality: Option<String>,
    /// Resolution string (e.g. "1280x720")
    pub resolution: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<f32>,
    /// Total bitrate in kbps
    pub tbr: Option<f32>,
    /// Video bitrate in kbps
    pub vbr: Option<f32>,
    pub filesize: Option<u64>,
    pub filesize_approx: Option<u64>,
    /// Video codec; "none" marks audio-only
    pub vcodec: Option<String>,
    /// Resolved media location, never exposed to clients
    #[serde(skip_serializing, default)]
    pub url: Option<String>,
}

impl FormatVariant {
    /// A missing codec counts as video; only an explicit "none" excludes it
    pub fn has_video(&self) -> bool {
        self.vcodec.as_deref() != Some("none")
    }

    pub fn has_source(&self) -> bool {
        self.url.as_deref().map_or(false, |u| !u.is_empty())
    }

    pub fn is_playable(&self) -> bool {
        self.has_video() && self.has_source()
    }

    /// Get effective file size (exact or approximate)
    pub fn effective_size(&self) -> Option<u64> {
        self.filesize.or(self.filesize_approx)
    }

    pub fn quality_label(&self) -> String {
        self.quality.clone().unwrap_or_else(|| "Unknown".to_string())
    }

    pub fn resolution_label(&self) -> String {
        if let Some(res) = self.resolution.as_deref().filter(|r| !r.is_empty()) {
            return res.to_string();
        }
        match (self.width, self.height) {
            (Some(w), Some(h)) => format!("{}x{}", w, h),
            (None, Some(h)) => format!("{}p", h),
            _ => "Unknown".to_string(),
        }
    }
}

/// Transfer metrics reported by the engine while fetching
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferMetrics {
    pub percent: f32,
    pub speed: Option<String>,
    pub eta: Option<String>,
    pub filename: Option<String>,
}

/// Opaque job identifier, never reused within a process
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Starting,
    Extracting,
    Downloading,
    Finished,
    Completed,
    Error,
    /// Query-time answer for an id that does not exist; never assigned
    Unknown,
}

impl JobStatus {
    /// Position in the lifecycle; statuses only ever move to a higher rank
    pub fn rank(&self) -> u8 {
        match self {
            Self::Starting => 0,
            Self::Extracting => 1,
            Self::Downloading => 2,
            Self::Finished => 3,
            Self::Completed | Self::Error => 4,
            Self::Unknown => 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Starting => "starting",
            Self::Extracting => "extracting",
            Self::Downloading => "downloading",
            Self::Finished => "finished",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Chosen variant as reported back to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatInfo {
    pub format_id: String,
    pub quality: String,
    pub resolution: String,
}

impl From<&FormatVariant> for FormatInfo {
    fn from(variant: &FormatVariant) -> Self {
        Self {
            format_id: variant.format_id.clone(),
            quality: variant.quality_label(),
            resolution: variant.resolution_label(),
        }
    }
}

/// Outcome of a successful download
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadSummary {
    pub title: String,
    pub uploader: String,
    pub duration: Option<f64>,
    /// Basename of the written file
    pub filename: String,
    /// Full path of the written file
    pub filepath: String,
    pub format_info: FormatInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&DownloadError> for JobFailure {
    fn from(err: &DownloadError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Terminal result of a job
#[derive(Debug, Clone, PartialEq)]
pub enum JobResult {
    Success(DownloadSummary),
    Failure(JobFailure),
}

impl JobResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Status a job takes on when this result is recorded
    pub fn terminal_status(&self) -> JobStatus {
        match self {
            Self::Success(_) => JobStatus::Completed,
            Self::Failure(_) => JobStatus::Error,
        }
    }
}

impl Serialize for JobResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct SuccessView<'a> {
            success: bool,
            #[serde(flatten)]
            summary: &'a DownloadSummary,
        }

        #[derive(Serialize)]
        struct FailureView<'a> {
            success: bool,
            kind: ErrorKind,
            error: &'static str,
            message: &'a str,
        }

        match self {
            Self::Success(summary) => SuccessView {
                success: true,
                summary,
            }
            .serialize(serializer),
            Self::Failure(failure) => FailureView {
                success: false,
                kind: failure.kind,
                error: failure.kind.label(),
                message: &failure.message,
            }
            .serialize(serializer),
        }
    }
}

/// Immutable copy of a job as seen by pollers
#[derive(Debug, Clone, Serialize)]
pub struct JobSnapshot {
    pub id: JobId,
    pub url: String,
    pub format_id: Option<String>,
    pub status: JobStatus,
    pub percent: f32,
    pub speed: Option<String>,
    pub eta: Option<String>,
    pub filename: Option<String>,
    pub message: Option<String>,
    /// RFC 3339 creation time
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
}
