use std::path::PathBuf;
use std::sync::Arc;

use crate::downloader::{DownloadOrchestrator, JobStore, MediaEngine, StreamingProxy};

/// Shared by every handler. The JobStore inside the orchestrator is the
/// only mutable state.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: DownloadOrchestrator,
    pub streaming: StreamingProxy,
    pub output_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(engine: Arc<dyn MediaEngine>, output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        Self {
            orchestrator: DownloadOrchestrator::new(
                engine.clone(),
                Arc::new(JobStore::new()),
                output_dir.clone(),
            ),
            streaming: StreamingProxy::new(engine),
            output_dir: Arc::new(output_dir),
        }
    }

    pub fn jobs(&self) -> &Arc<JobStore> {
        self.orchestrator.jobs()
    }
}
