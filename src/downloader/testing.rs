// Scripted engine used by unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use super::errors::DownloadError;
use super::models::{FormatVariant, MediaDescriptor, TransferMetrics};
use super::traits::{DownloadEvent, FetchSink, MediaEngine, ProgressCallback};

pub struct ScriptedEngine {
    pub probe_result: Result<Option<MediaDescriptor>, DownloadError>,
    pub fetch_error: Option<DownloadError>,
    /// Chunks written (disk) or forwarded (stream) on fetch
    pub payload: Vec<Bytes>,
    pub probe_calls: AtomicUsize,
    pub fetched: Mutex<Vec<String>>,
}

impl ScriptedEngine {
    pub fn with_descriptor(info: MediaDescriptor) -> Self {
        Self {
            probe_result: Ok(Some(info)),
            fetch_error: None,
            payload: vec![Bytes::from_static(b"chunk-1"), Bytes::from_static(b"chunk-2")],
            probe_calls: AtomicUsize::new(0),
            fetched: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_probe(err: DownloadError) -> Self {
        Self {
            probe_result: Err(err),
            ..Self::with_descriptor(two_variants())
        }
    }

    pub fn probes(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    pub fn fetched_formats(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaEngine for ScriptedEngine {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn probe(&self, _url: &str) -> Result<Option<MediaDescriptor>, DownloadError> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        self.probe_result.clone()
    }

    async fn fetch(
        &self,
        _url: &str,
        format_id: &str,
        sink: FetchSink,
        on_progress: Option<ProgressCallback>,
    ) -> Result<(), DownloadError> {
        self.fetched.lock().unwrap().push(format_id.to_string());

        match sink {
            FetchSink::File(path) => {
                for percent in [10.0, 55.5, 100.0] {
                    if let Some(callback) = &on_progress {
                        callback(DownloadEvent::Progress(TransferMetrics {
                            percent,
                            speed: Some("1.00MiB/s".to_string()),
                            eta: Some("00:01".to_string()),
                            filename: Some(path.display().to_string()),
                        }));
                    }
                }
                if let Some(err) = &self.fetch_error {
                    return Err(err.clone());
                }
                let body: Vec<u8> = self.payload.iter().flat_map(|b| b.to_vec()).collect();
                tokio::fs::write(&path, body).await?;
                Ok(())
            }
            FetchSink::Channel(tx) => {
                for chunk in &self.payload {
                    if tx.send(Ok(chunk.clone())).await.is_err() {
                        return Ok(());
                    }
                }
                if let Some(err) = &self.fetch_error {
                    let _ = tx
                        .send(Err(std::io::Error::new(std::io::ErrorKind::Other, err.to_string())))
                        .await;
                    return Err(err.clone());
                }
                Ok(())
            }
        }
    }
}

pub fn variant(id: &str, height: u32, tbr: f32) -> FormatVariant {
    FormatVariant {
        format_id: id.to_string(),
        ext: "mp4".to_string(),
        quality: Some(format!("{}p", height)),
        width: Some(height * 16 / 9),
        height: Some(height),
        tbr: Some(tbr),
        vcodec: Some("avc1".to_string()),
        url: Some(format!("https://video.twimg.com/{}.mp4", id)),
        ..Default::default()
    }
}

/// 480p/1000kbps listed before 720p/2000kbps
pub fn two_variants() -> MediaDescriptor {
    MediaDescriptor {
        id: "123456".to_string(),
        title: "A clip: with/odd chars".to_string(),
        uploader: "user".to_string(),
        duration: Some(8.0),
        thumbnail: Some("https://pbs.twimg.com/t.jpg".to_string()),
        formats: vec![variant("http-1000", 480, 1000.0), variant("http-2000", 720, 2000.0)],
    }
}
