// DownloadOrchestrator - one pipeline for disk downloads
//
// validate -> extracting/probe -> playable check -> select
//   -> downloading/fetch (progress) -> finished
//
// `start` runs it on a background task against the JobStore, `run` awaits it
// inline (CLI), `download` is the bare pipeline with an optional observer.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::errors::DownloadError;
use super::format_selector::FormatSelector;
use super::job_store::JobStore;
use super::models::{DownloadSummary, FormatInfo, JobFailure, JobId, JobResult, JobStatus, MediaDescriptor};
use super::traits::{DownloadEvent, FetchSink, MediaEngine, ProgressCallback};
use super::url_validator;
use super::utils::output_path;

/// Probe a URL and make sure at least one playable variant exists
pub async fn probe_video(engine: &dyn MediaEngine, url: &str) -> Result<MediaDescriptor, DownloadError> {
    let info = engine.probe(url).await?.ok_or(DownloadError::NoVideoFound)?;
    if FormatSelector::rank(&info.formats).is_empty() {
        return Err(DownloadError::NoVideoContent);
    }
    Ok(info)
}

#[derive(Clone)]
pub struct DownloadOrchestrator {
    engine: Arc<dyn MediaEngine>,
    jobs: Arc<JobStore>,
    output_dir: PathBuf,
}

impl DownloadOrchestrator {
    pub fn new(engine: Arc<dyn MediaEngine>, jobs: Arc<JobStore>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            engine,
            jobs,
            output_dir: output_dir.into(),
        }
    }

    pub fn engine(&self) -> &Arc<dyn MediaEngine> {
        &self.engine
    }

    pub fn jobs(&self) -> &Arc<JobStore> {
        &self.jobs
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// The download pipeline. Status and progress events go to `observer`.
    pub async fn download(
        &self,
        url: &str,
        format_id: Option<&str>,
        observer: Option<ProgressCallback>,
    ) -> Result<DownloadSummary, DownloadError> {
        let notify = |status: JobStatus| {
            if let Some(callback) = &observer {
                callback(DownloadEvent::Status(status));
            }
        };

        url_validator::validate(url)?;

        notify(JobStatus::Extracting);
        let info = probe_video(self.engine.as_ref(), url).await?;
        let variant = FormatSelector::resolve(&info.formats, format_id)?;
        let path = output_path(&self.output_dir, &info, variant);

        tracing::info!(
            target: "orchestrator",
            engine = self.engine.name(),
            format = %variant.format_id,
            resolution = %variant.resolution_label(),
            "downloading \"{}\" to {}",
            info.title,
            path.display()
        );

        tokio::fs::create_dir_all(&self.output_dir).await?;
        notify(JobStatus::Downloading);
        self.engine
            .fetch(url, &variant.format_id, FetchSink::File(path.clone()), observer.clone())
            .await?;
        notify(JobStatus::Finished);

        Ok(DownloadSummary {
            title: info.title.clone(),
            uploader: info.uploader.clone(),
            duration: info.duration,
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            filepath: path.display().to_string(),
            format_info: FormatInfo::from(variant),
        })
    }

    /// Register a job and run it in the background. Returns immediately.
    pub fn start(&self, url: impl Into<String>, format_id: Option<String>) -> JobId {
        let url = url.into();
        let id = self.jobs.create(url.clone(), format_id.clone());
        tracing::info!(target: "orchestrator", job = %id, url = %url, "job started");

        let this = self.clone();
        let job = id.clone();
        tokio::spawn(async move {
            let _ = this.run_job(&job, &url, format_id.as_deref(), None).await;
        });
        id
    }

    /// Register a job and run it to completion on the current task
    pub async fn run(
        &self,
        url: &str,
        format_id: Option<&str>,
        observer: Option<ProgressCallback>,
    ) -> (JobId, Result<DownloadSummary, DownloadError>) {
        let id = self.jobs.create(url, format_id.map(str::to_string));
        let outcome = self.run_job(&id, url, format_id, observer).await;
        (id, outcome)
    }

    async fn run_job(
        &self,
        id: &JobId,
        url: &str,
        format_id: Option<&str>,
        extra: Option<ProgressCallback>,
    ) -> Result<DownloadSummary, DownloadError> {
        let observer = self.job_observer(id.clone(), extra);

        // own task: a panic still ends the job
        let worker = self.clone();
        let task_url = url.to_string();
        let task_format = format_id.map(str::to_string);
        let handle = tokio::spawn(async move {
            worker
                .download(&task_url, task_format.as_deref(), Some(observer))
                .await
        });
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => Err(DownloadError::Internal(format!("download task failed: {}", e))),
        };

        let result = match &outcome {
            Ok(summary) => {
                tracing::info!(target: "orchestrator", job = %id, file = %summary.filename, "job completed");
                JobResult::Success(summary.clone())
            }
            Err(err) => {
                tracing::warn!(target: "orchestrator", job = %id, kind = ?err.kind(), "job failed: {}", err);
                JobResult::Failure(JobFailure::from(err))
            }
        };
        self.jobs.complete(id, result);
        outcome
    }

    /// Observer that records events into the JobStore, then forwards them
    fn job_observer(&self, id: JobId, extra: Option<ProgressCallback>) -> ProgressCallback {
        let jobs = self.jobs.clone();
        Arc::new(move |event: DownloadEvent| {
            match &event {
                DownloadEvent::Status(status) => {
                    jobs.transition(&id, *status);
                }
                DownloadEvent::Progress(metrics) => {
                    jobs.update_progress(&id, metrics.clone());
                }
            }
            if let Some(callback) = &extra {
                callback(event);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::errors::ErrorKind;
    use crate::downloader::models::JobSnapshot;
    use crate::downloader::testing::{two_variants, ScriptedEngine};
    use std::sync::Mutex;
    use std::time::Duration;

    fn orchestrator(engine: Arc<ScriptedEngine>, dir: &Path) -> DownloadOrchestrator {
        DownloadOrchestrator::new(engine, Arc::new(JobStore::new()), dir)
    }

    async fn wait_terminal(orch: &DownloadOrchestrator, id: &JobId) -> JobSnapshot {
        for _ in 0..200 {
            let snap = orch.jobs().get(id).unwrap();
            if snap.status.is_terminal() {
                return snap;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} never finished", id);
    }

    #[tokio::test]
    async fn test_best_variant_downloaded() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(ScriptedEngine::with_descriptor(two_variants()));
        let orch = orchestrator(engine.clone(), dir.path());

        let id = orch.start("https://x.com/user/status/123456", None);
        let snap = wait_terminal(&orch, &id).await;

        assert_eq!(snap.status, JobStatus::Completed);
        assert_eq!(snap.percent, 100.0);
        match snap.result {
            Some(JobResult::Success(summary)) => {
                assert_eq!(summary.format_info.resolution, "1280x720");
                assert_eq!(summary.format_info.format_id, "http-2000");
                assert_eq!(summary.filename, "user_A clip_ with_odd chars_123456.mp4");
                assert!(Path::new(&summary.filepath).exists());
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(engine.fetched_formats(), vec!["http-2000".to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_url_never_reaches_engine() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(ScriptedEngine::with_descriptor(two_variants()));
        let orch = orchestrator(engine.clone(), dir.path());

        let id = orch.start("not-a-url", None);
        let snap = wait_terminal(&orch, &id).await;

        assert_eq!(snap.status, JobStatus::Error);
        match snap.result {
            Some(JobResult::Failure(f)) => assert_eq!(f.kind, ErrorKind::InvalidUrl),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(engine.probes(), 0);
        assert!(engine.fetched_formats().is_empty());
    }

    #[tokio::test]
    async fn test_private_probe_is_classified() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(ScriptedEngine::failing_probe(DownloadError::classify(
            "ERROR: [twitter] 123456: This tweet is from a private account",
        )));
        let orch = orchestrator(engine.clone(), dir.path());

        let id = orch.start("https://x.com/user/status/123456", None);
        let snap = wait_terminal(&orch, &id).await;
        match snap.result {
            Some(JobResult::Failure(f)) => assert_eq!(f.kind, ErrorKind::PrivateOrProtected),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(engine.fetched_formats().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_format_fails_job() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(ScriptedEngine::with_descriptor(two_variants()));
        let orch = orchestrator(engine.clone(), dir.path());

        let id = orch.start("https://x.com/user/status/123456", Some("1080".to_string()));
        let snap = wait_terminal(&orch, &id).await;

        assert_eq!(snap.status, JobStatus::Error);
        match snap.result {
            Some(JobResult::Failure(f)) => assert_eq!(f.kind, ErrorKind::FormatNotFound),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(engine.fetched_formats().is_empty());
    }

    #[tokio::test]
    async fn test_requested_format_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(ScriptedEngine::with_descriptor(two_variants()));
        let orch = orchestrator(engine.clone(), dir.path());

        let (_, outcome) = orch
            .run("https://x.com/user/status/123456", Some("http-1000"), None)
            .await;
        assert_eq!(outcome.unwrap().format_info.format_id, "http-1000");
    }

    #[tokio::test]
    async fn test_probe_without_descriptor_or_video() {
        let dir = tempfile::tempdir().unwrap();

        let mut empty = ScriptedEngine::with_descriptor(two_variants());
        empty.probe_result = Ok(None);
        let orch = orchestrator(Arc::new(empty), dir.path());
        let (_, outcome) = orch.run("https://x.com/user/status/1", None, None).await;
        assert_eq!(outcome.unwrap_err().kind(), ErrorKind::NoVideoFound);

        let mut info = two_variants();
        for f in &mut info.formats {
            f.vcodec = Some("none".to_string());
        }
        let orch = orchestrator(Arc::new(ScriptedEngine::with_descriptor(info)), dir.path());
        let (id, outcome) = orch.run("https://x.com/user/status/1", None, None).await;
        assert_eq!(outcome.unwrap_err().kind(), ErrorKind::NoVideoContent);
        assert_eq!(orch.jobs().status(&id), JobStatus::Error);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_terminal() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = ScriptedEngine::with_descriptor(two_variants());
        engine.fetch_error = Some(DownloadError::classify("ERROR: unable to download video data: HTTP Error 403"));
        let orch = orchestrator(Arc::new(engine), dir.path());

        let (id, outcome) = orch.run("https://x.com/user/status/123456", None, None).await;
        let err = outcome.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EngineFailure);
        assert_eq!(err.to_string(), "ERROR: unable to download video data: HTTP Error 403");

        let snap = orch.jobs().get(&id).unwrap();
        assert_eq!(snap.status, JobStatus::Error);
        // progress seen before the failure is kept
        assert_eq!(snap.percent, 100.0);
    }

    #[tokio::test]
    async fn test_observer_sees_ordered_statuses() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(ScriptedEngine::with_descriptor(two_variants()));
        let orch = orchestrator(engine, dir.path());

        let seen: Arc<Mutex<Vec<DownloadEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let observer: ProgressCallback = Arc::new(move |event| sink.lock().unwrap().push(event));

        let (id, outcome) = orch
            .run("https://x.com/user/status/123456", None, Some(observer))
            .await;
        assert!(outcome.is_ok());

        let events = seen.lock().unwrap().clone();
        let statuses: Vec<JobStatus> = events
            .iter()
            .filter_map(|e| match e {
                DownloadEvent::Status(s) => Some(*s),
                _ => None,
            })
            .collect();
        assert_eq!(
            statuses,
            vec![JobStatus::Extracting, JobStatus::Downloading, JobStatus::Finished]
        );

        let percents: Vec<f32> = events
            .iter()
            .filter_map(|e| match e {
                DownloadEvent::Progress(m) => Some(m.percent),
                _ => None,
            })
            .collect();
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(orch.jobs().status(&id), JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_polled_statuses_never_regress() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Arc::new(ScriptedEngine::with_descriptor(two_variants()));
        let orch = orchestrator(engine, dir.path());

        let id = orch.start("https://x.com/user/status/123456", None);
        let mut observed = vec![orch.jobs().status(&id)];
        loop {
            let status = orch.jobs().status(&id);
            if observed.last() != Some(&status) {
                observed.push(status);
            }
            if status.is_terminal() {
                break;
            }
            tokio::task::yield_now().await;
        }

        assert!(observed.windows(2).all(|w| w[0].rank() < w[1].rank()));
        assert_eq!(observed.last(), Some(&JobStatus::Completed));
    }
}
