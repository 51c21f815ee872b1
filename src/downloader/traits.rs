// Extraction engine trait definition

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use super::errors::DownloadError;
use super::models::{JobStatus, TransferMetrics, MediaDescriptor};

/// Where fetched bytes go
#[derive(Debug)]
pub enum FetchSink {
    /// Engine writes the media to this path
    File(PathBuf),
    /// Engine forwards chunks as they arrive; a closed receiver means
    /// the consumer is gone and the fetch must stop
    Channel(mpsc::Sender<io::Result<Bytes>>),
}

/// Event pushed to an observer while a download runs
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadEvent {
    Status(JobStatus),
    Progress(TransferMetrics),
}

/// Observer callback; may be invoked from any task
pub type ProgressCallback = Arc<dyn Fn(DownloadEvent) + Send + Sync>;

/// External extraction engine (black box)
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Name of the engine (for logging)
    fn name(&self) -> &'static str;

    /// Read-only metadata extraction. `Ok(None)` means the engine answered
    /// but had nothing usable for this URL.
    async fn probe(&self, url: &str) -> Result<Option<MediaDescriptor>, DownloadError>;

    /// Transfer one variant into the sink, reporting progress if asked
    async fn fetch(
        &self,
        url: &str,
        format_id: &str,
        sink: FetchSink,
        on_progress: Option<ProgressCallback>,
    ) -> Result<(), DownloadError>;
}
