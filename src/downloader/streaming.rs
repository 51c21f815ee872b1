// StreamingProxy - request-scoped pass-through of media bytes
//
// Nothing is registered anywhere: `prepare` fails before any engine
// process is started for the transfer, and `open` ties the engine fetch to
// the lifetime of the returned stream.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

use super::errors::DownloadError;
use super::format_selector::FormatSelector;
use super::models::FormatVariant;
use super::orchestrator::probe_video;
use super::traits::{FetchSink, MediaEngine};
use super::url_validator;
use super::utils::stream_filename;

/// Chunks buffered between the engine and the response body
pub const STREAM_BUFFER_CHUNKS: usize = 16;

/// Everything needed to send headers and start the transfer
#[derive(Debug, Clone)]
pub struct PreparedStream {
    pub url: String,
    pub variant: FormatVariant,
    pub filename: String,
    pub content_type: &'static str,
}

#[derive(Clone)]
pub struct StreamingProxy {
    engine: Arc<dyn MediaEngine>,
}

impl StreamingProxy {
    pub fn new(engine: Arc<dyn MediaEngine>) -> Self {
        Self { engine }
    }

    /// Validate, probe and select. No bytes move yet.
    pub async fn prepare(&self, url: &str, format_id: Option<&str>) -> Result<PreparedStream, DownloadError> {
        url_validator::validate(url)?;
        let info = probe_video(self.engine.as_ref(), url).await?;
        let variant = FormatSelector::resolve(&info.formats, format_id)?;

        Ok(PreparedStream {
            url: url.to_string(),
            filename: stream_filename(&info, variant),
            content_type: content_type_for(&variant.ext),
            variant: variant.clone(),
        })
    }

    /// Start the engine fetch and hand back its byte stream
    pub fn open(&self, prepared: &PreparedStream) -> MediaStream {
        let (tx, rx) = mpsc::channel(STREAM_BUFFER_CHUNKS);
        let engine = self.engine.clone();
        let url = prepared.url.clone();
        let format_id = prepared.variant.format_id.clone();
        let filename = prepared.filename.clone();

        let task = tokio::spawn(async move {
            tracing::info!(target: "stream", format = %format_id, "streaming {}", filename);
            match engine.fetch(&url, &format_id, FetchSink::Channel(tx), None).await {
                Ok(()) => tracing::debug!(target: "stream", "stream finished: {}", filename),
                Err(e) => tracing::warn!(target: "stream", kind = ?e.kind(), "stream aborted: {}", e),
            }
        });

        MediaStream {
            inner: ReceiverStream::new(rx),
            task,
        }
    }
}

/// Byte stream of one engine fetch. Dropping it stops the fetch and,
/// with it, the engine process.
pub struct MediaStream {
    inner: ReceiverStream<io::Result<Bytes>>,
    task: JoinHandle<()>,
}

impl Stream for MediaStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl Drop for MediaStream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Response content type for a container extension
pub fn content_type_for(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "webm" => "video/webm",
        "mov" | "qt" => "video/quicktime",
        "mkv" => "video/x-matroska",
        _ => "video/mp4",
    }
}
