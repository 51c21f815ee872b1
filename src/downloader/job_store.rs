// JobStore - concurrent registry of download jobs
//
// Backed by a sharded map: writes to different jobs land on different
// shards and never queue behind each other. Every mutation is O(1) and
// holds its shard lock only for the duration of the update.
//
// Entries are never evicted. Callers own garbage collection of old jobs.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use super::models::{JobId, JobResult, JobSnapshot, JobStatus, TransferMetrics};

#[derive(Debug, Clone)]
struct JobRecord {
    url: String,
    format_id: Option<String>,
    status: JobStatus,
    metrics: TransferMetrics,
    message: Option<String>,
    created_at: OffsetDateTime,
    result: Option<JobResult>,
}

#[derive(Debug, Default)]
pub struct JobStore {
    next_seq: AtomicU64,
    jobs: DashMap<JobId, JobRecord>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new job in `Starting` and return its id
    pub fn create(&self, url: impl Into<String>, format_id: Option<String>) -> JobId {
        let created_at = OffsetDateTime::now_utc();
        let record = JobRecord {
            url: url.into(),
            format_id,
            status: JobStatus::Starting,
            metrics: TransferMetrics::default(),
            message: Some("Initializing download...".to_string()),
            created_at,
            result: None,
        };

        loop {
            // time-derived for readability; the sequence makes it unique
            let seq = self.next_seq.fetch_add(1, Ordering::Relaxed) + 1;
            let id = JobId::new(format!("download_{}_{}", created_at.unix_timestamp(), seq));
            if let dashmap::mapref::entry::Entry::Vacant(slot) = self.jobs.entry(id.clone()) {
                slot.insert(record);
                tracing::debug!(target: "jobs", job = %id, "job created");
                return id;
            }
        }
    }

    /// Snapshot of a job, or `None` when the id was never created
    pub fn get(&self, id: &JobId) -> Option<JobSnapshot> {
        self.jobs.get(id).map(|entry| Self::snapshot(id, entry.value()))
    }

    /// Status for an id; `Unknown` when absent
    pub fn status(&self, id: &JobId) -> JobStatus {
        self.jobs
            .get(id)
            .map(|entry| entry.status)
            .unwrap_or(JobStatus::Unknown)
    }

    /// Record transfer metrics. Percent never goes backwards and nothing
    /// changes once the job is terminal.
    pub fn update_progress(&self, id: &JobId, metrics: TransferMetrics) -> bool {
        let Some(mut entry) = self.jobs.get_mut(id) else {
            return false;
        };
        if entry.status.is_terminal() {
            return false;
        }

        let percent = metrics.percent.clamp(0.0, 100.0).max(entry.metrics.percent);
        let filename = metrics.filename.or_else(|| entry.metrics.filename.take());
        entry.metrics = TransferMetrics {
            percent,
            speed: metrics.speed,
            eta: metrics.eta,
            filename,
        };
        true
    }

    /// Move a job forward. Backward moves, moves out of a terminal state
    /// and moves into a terminal state (use `complete`) are refused.
    pub fn transition(&self, id: &JobId, status: JobStatus) -> bool {
        if status.is_terminal() || status == JobStatus::Unknown {
            return false;
        }

        let Some(mut entry) = self.jobs.get_mut(id) else {
            return false;
        };
        if entry.status.is_terminal() || status.rank() <= entry.status.rank() {
            tracing::warn!(
                target: "jobs",
                job = %id,
                from = %entry.status,
                to = %status,
                "rejected status transition"
            );
            return false;
        }

        entry.status = status;
        entry.message = Self::status_message(status);
        if status == JobStatus::Finished {
            entry.metrics.percent = 100.0;
        }
        true
    }

    /// Attach the terminal result. Status and result are written together,
    /// and only once per job.
    pub fn complete(&self, id: &JobId, result: JobResult) -> bool {
        let Some(mut entry) = self.jobs.get_mut(id) else {
            return false;
        };
        if entry.status.is_terminal() {
            return false;
        }

        let status = result.terminal_status();
        entry.message = match &result {
            JobResult::Success(_) => Some("Download completed successfully!".to_string()),
            JobResult::Failure(failure) => Some(failure.message.clone()),
        };
        if result.is_success() {
            entry.metrics.percent = 100.0;
        }
        entry.status = status;
        entry.result = Some(result);
        tracing::debug!(target: "jobs", job = %id, status = %status, "job completed");
        true
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    fn snapshot(id: &JobId, record: &JobRecord) -> JobSnapshot {
        JobSnapshot {
            id: id.clone(),
            url: record.url.clone(),
            format_id: record.format_id.clone(),
            status: record.status,
            percent: record.metrics.percent,
            speed: record.metrics.speed.clone(),
            eta: record.metrics.eta.clone(),
            filename: record.metrics.filename.clone(),
            message: record.message.clone(),
            created_at: record
                .created_at
                .format(&Rfc3339)
                .unwrap_or_else(|_| record.created_at.unix_timestamp().to_string()),
            result: record.result.clone(),
        }
    }

    fn status_message(status: JobStatus) -> Option<String> {
        let msg = match status {
            JobStatus::Starting => "Initializing download...",
            JobStatus::Extracting => "Extracting video information...",
            JobStatus::Downloading => "Downloading...",
            JobStatus::Finished => "Finalizing...",
            _ => return None,
        };
        Some(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::errors::ErrorKind;
    use crate::downloader::models::{DownloadSummary, FormatInfo, JobFailure};
    use std::collections::HashSet;
    use std::sync::Arc;

    fn summary() -> DownloadSummary {
        DownloadSummary {
            title: "title".to_string(),
            uploader: "user".to_string(),
            duration: Some(3.5),
            filename: "user_title_1.mp4".to_string(),
            filepath: "downloads/user_title_1.mp4".to_string(),
            format_info: FormatInfo {
                format_id: "http-2176".to_string(),
                quality: "720p".to_string(),
                resolution: "1280x720".to_string(),
            },
        }
    }

    fn metrics(percent: f32) -> TransferMetrics {
        TransferMetrics {
            percent,
            speed: Some("1.00MiB/s".to_string()),
            eta: Some("00:03".to_string()),
            filename: None,
        }
    }

    #[test]
    fn test_unknown_id() {
        let store = JobStore::new();
        let id = JobId::new("download_0_999");
        assert!(store.get(&id).is_none());
        assert_eq!(store.status(&id), JobStatus::Unknown);
        assert!(!store.transition(&id, JobStatus::Extracting));
        assert!(!store.update_progress(&id, metrics(10.0)));
    }

    #[test]
    fn test_create_starts_in_starting() {
        let store = JobStore::new();
        let id = store.create("https://x.com/u/status/1", Some("720".to_string()));
        let snap = store.get(&id).unwrap();
        assert_eq!(snap.status, JobStatus::Starting);
        assert_eq!(snap.format_id.as_deref(), Some("720"));
        assert!(snap.result.is_none());
    }

    #[test]
    fn test_concurrent_creates_never_collide() {
        let store = Arc::new(JobStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    (0..250)
                        .map(|_| store.create("https://x.com/u/status/1", None))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(ids.insert(id));
            }
        }
        assert_eq!(ids.len(), 2000);
        assert_eq!(store.len(), 2000);
    }

    #[test]
    fn test_transitions_are_monotonic() {
        let store = JobStore::new();
        let id = store.create("u", None);

        assert!(store.transition(&id, JobStatus::Extracting));
        assert!(!store.transition(&id, JobStatus::Starting));
        assert!(!store.transition(&id, JobStatus::Extracting));
        assert!(store.transition(&id, JobStatus::Downloading));
        assert!(store.transition(&id, JobStatus::Finished));
        assert!(!store.transition(&id, JobStatus::Downloading));
        assert_eq!(store.status(&id), JobStatus::Finished);
    }

    #[test]
    fn test_terminal_states_only_via_complete() {
        let store = JobStore::new();
        let id = store.create("u", None);
        assert!(!store.transition(&id, JobStatus::Completed));
        assert!(!store.transition(&id, JobStatus::Error));
        assert!(!store.transition(&id, JobStatus::Unknown));
        assert_eq!(store.status(&id), JobStatus::Starting);
    }

    #[test]
    fn test_complete_sets_result_once() {
        let store = JobStore::new();
        let id = store.create("u", None);
        assert!(store.complete(&id, JobResult::Success(summary())));

        let failure = JobResult::Failure(JobFailure {
            kind: ErrorKind::InternalError,
            message: "late".to_string(),
        });
        assert!(!store.complete(&id, failure));
        assert!(!store.transition(&id, JobStatus::Finished));

        let snap = store.get(&id).unwrap();
        assert_eq!(snap.status, JobStatus::Completed);
        assert_eq!(snap.percent, 100.0);
        assert!(matches!(snap.result, Some(JobResult::Success(_))));
    }

    #[test]
    fn test_failure_result_sets_error() {
        let store = JobStore::new();
        let id = store.create("u", None);
        store.transition(&id, JobStatus::Extracting);
        store.complete(
            &id,
            JobResult::Failure(JobFailure {
                kind: ErrorKind::PrivateOrProtected,
                message: "This tweet is from a private account".to_string(),
            }),
        );

        let snap = store.get(&id).unwrap();
        assert_eq!(snap.status, JobStatus::Error);
        match snap.result {
            Some(JobResult::Failure(f)) => assert_eq!(f.kind, ErrorKind::PrivateOrProtected),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_progress_percent_never_regresses() {
        let store = JobStore::new();
        let id = store.create("u", None);
        store.transition(&id, JobStatus::Downloading);

        store.update_progress(
            &id,
            TransferMetrics {
                filename: Some("a.mp4".to_string()),
                ..metrics(40.0)
            },
        );
        store.update_progress(&id, metrics(25.0));
        let snap = store.get(&id).unwrap();
        assert_eq!(snap.percent, 40.0);
        // filename is sticky
        assert_eq!(snap.filename.as_deref(), Some("a.mp4"));

        store.update_progress(&id, metrics(250.0));
        assert_eq!(store.get(&id).unwrap().percent, 100.0);
    }

    #[test]
    fn test_progress_ignored_after_terminal() {
        let store = JobStore::new();
        let id = store.create("u", None);
        store.complete(&id, JobResult::Success(summary()));
        assert!(!store.update_progress(&id, metrics(10.0)));
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let store = JobStore::new();
        let id = store.create("u", None);
        let before = store.get(&id).unwrap();
        store.transition(&id, JobStatus::Extracting);
        assert_eq!(before.status, JobStatus::Starting);
        assert_eq!(store.get(&id).unwrap().status, JobStatus::Extracting);
    }

    #[test]
    fn test_entries_are_never_evicted() {
        // Known limitation: the store grows without bound.
        let store = JobStore::new();
        let ids: Vec<JobId> = (0..100).map(|_| store.create("u", None)).collect();
        for id in &ids {
            store.complete(id, JobResult::Success(summary()));
        }
        assert_eq!(store.len(), 100);
        assert!(ids.iter().all(|id| store.get(id).is_some()));
    }
}
