// Downloader module - validation, selection, job tracking and the
// engine-facing download pipelines

pub mod errors;
pub mod extractors;
pub mod format_selector;
pub mod job_store;
pub mod models;
pub mod orchestrator;
pub mod streaming;
pub mod traits;
pub mod url_validator;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{DownloadError, ErrorKind};
pub use extractors::{EngineConfig, YtDlpCli};
pub use format_selector::FormatSelector;
pub use job_store::JobStore;
pub use models::{
    DownloadSummary, FormatInfo, FormatVariant, JobId, JobResult, JobSnapshot, JobStatus,
    MediaDescriptor, TransferMetrics,
};
pub use orchestrator::{probe_video, DownloadOrchestrator};
pub use streaming::{MediaStream, PreparedStream, StreamingProxy};
pub use traits::{DownloadEvent, FetchSink, MediaEngine, ProgressCallback};
