// yt-dlp CLI engine - drives the native `yt-dlp` binary
//
// probe: `--dump-json` under a timeout, parsed into a MediaDescriptor
// fetch to file: `--newline` progress lines on stdout, parsed as they arrive
// fetch to channel: media bytes on stdout (`-o -`), forwarded in 8 KiB chunks
//
// Every child is spawned with kill_on_drop, so dropping a fetch future
// terminates the process.

use std::io;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, Command as TokioCommand};
use tokio::sync::mpsc;

use super::config::EngineConfig;
use super::progress::ProgressParser;
use crate::downloader::errors::DownloadError;
use crate::downloader::models::{FormatVariant, MediaDescriptor};
use crate::downloader::traits::{DownloadEvent, FetchSink, MediaEngine, ProgressCallback};
use crate::downloader::utils::{collect_pipe, join_pipe, last_error_line, run_output_with_timeout};

/// Size of one forwarded chunk in streaming mode
pub const CHUNK_SIZE: usize = 8192;

pub struct YtDlpCli {
    config: EngineConfig,
}

impl YtDlpCli {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Flags shared by every invocation
    fn common_args(&self) -> Vec<String> {
        let mut args = vec![
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--socket-timeout".to_string(),
            self.config.socket_timeout.to_string(),
        ];

        if let Some(path) = &self.config.cookies_path {
            args.push("--cookies".to_string());
            args.push(path.clone());
        }

        if let Some(proxy) = &self.config.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }

        args
    }

    fn probe_args(&self, url: &str) -> Vec<String> {
        let mut args = vec!["--dump-json".to_string()];
        args.extend(self.common_args());
        args.push(url.to_string());
        args
    }

    /// `output` is a path, or "-" for stdout
    fn fetch_args(&self, url: &str, format_id: &str, output: &str) -> Vec<String> {
        let mut args = vec!["-f".to_string(), format_id.to_string()];
        args.extend(self.common_args());

        let template = if output == "-" {
            args.push("--no-progress".to_string());
            output.to_string()
        } else {
            args.push("--newline".to_string());
            args.push("--no-part".to_string());
            // `-o` is an output template: a literal `%` must be doubled
            output.replace('%', "%%")
        };

        args.push("-o".to_string());
        args.push(template);
        args.push(url.to_string());
        args
    }

    fn spawn(&self, args: &[String]) -> Result<Child, DownloadError> {
        tracing::debug!(target: "engine", "{} {}", self.config.binary, args.join(" "));
        TokioCommand::new(&self.config.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                DownloadError::Internal(format!("Failed to start {}: {}", self.config.binary, e))
            })
    }

    /// Parse `--dump-json` output. `null`, empty output and playlists
    /// without entries yield `None`.
    pub fn parse_json(stdout: &[u8]) -> Result<Option<MediaDescriptor>, DownloadError> {
        let text = String::from_utf8_lossy(stdout);
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        let json: Value = serde_json::from_str(text)
            .map_err(|e| DownloadError::Internal(format!("Invalid JSON from engine: {}", e)))?;

        // multi-video posts come back as a playlist; take the first entry
        let entry = match json.get("entries").and_then(Value::as_array) {
            Some(entries) => match entries.iter().find(|e| e.is_object()) {
                Some(first) => first,
                None => return Ok(None),
            },
            None => &json,
        };
        if !entry.is_object() {
            return Ok(None);
        }

        Ok(Some(MediaDescriptor {
            id: string_field(entry, "id").unwrap_or_else(|| "unknown".to_string()),
            title: string_field(entry, "title").unwrap_or_else(|| "Unknown".to_string()),
            uploader: string_field(entry, "uploader")
                .or_else(|| string_field(entry, "uploader_id"))
                .unwrap_or_else(|| "Unknown".to_string()),
            duration: entry["duration"].as_f64(),
            thumbnail: string_field(entry, "thumbnail"),
            formats: Self::parse_formats(entry),
        }))
    }

    fn parse_formats(json: &Value) -> Vec<FormatVariant> {
        match json["formats"].as_array() {
            Some(formats) => formats.iter().map(Self::parse_format).collect(),
            // single-format answers carry the fields at the top level
            None if json.get("url").is_some() && json.get("format_id").is_some() => {
                vec![Self::parse_format(json)]
            }
            None => Vec::new(),
        }
    }

    fn parse_format(f: &Value) -> FormatVariant {
        FormatVariant {
            format_id: string_field(f, "format_id").unwrap_or_default(),
            ext: string_field(f, "ext").unwrap_or_default(),
            quality: string_field(f, "format_note"),
            resolution: string_field(f, "resolution"),
            width: f["width"].as_u64().map(|w| w as u32),
            height: f["height"].as_u64().map(|h| h as u32),
            fps: f["fps"].as_f64().map(|fps| fps as f32),
            tbr: f["tbr"].as_f64().map(|t| t as f32),
            vbr: f["vbr"].as_f64().map(|v| v as f32),
            filesize: f["filesize"].as_u64(),
            filesize_approx: f["filesize_approx"].as_u64(),
            vcodec: string_field(f, "vcodec"),
            url: string_field(f, "url"),
        }
    }

    async fn fetch_to_file(
        &self,
        url: &str,
        format_id: &str,
        path: &Path,
        on_progress: Option<ProgressCallback>,
    ) -> Result<(), DownloadError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let args = self.fetch_args(url, format_id, &path.to_string_lossy());
        let mut child = self.spawn(&args)?;
        let stderr_task = collect_pipe(child.stderr.take());

        if let Some(stdout) = child.stdout.take() {
            let mut parser = ProgressParser::new();
            let mut lines = BufReader::new(stdout).split(b'\n');
            while let Some(raw) = lines.next_segment().await? {
                let line = String::from_utf8_lossy(&raw);
                if let Some(metrics) = parser.parse_line(line.trim_end()) {
                    if let Some(callback) = &on_progress {
                        callback(DownloadEvent::Progress(metrics));
                    }
                }
            }
        }

        let status = child.wait().await?;
        let stderr = join_pipe(stderr_task).await?;
        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            tracing::debug!(target: "engine", stderr = %stderr, "fetch failed");
            return Err(DownloadError::classify(last_error_line(&stderr)));
        }

        if tokio::fs::metadata(path).await.is_err() {
            return Err(DownloadError::Internal(format!(
                "Engine finished but {} was not written",
                path.display()
            )));
        }
        Ok(())
    }

    async fn fetch_to_channel(
        &self,
        url: &str,
        format_id: &str,
        tx: mpsc::Sender<io::Result<Bytes>>,
    ) -> Result<(), DownloadError> {
        let args = self.fetch_args(url, format_id, "-");
        let mut child = self.spawn(&args)?;
        let stderr_task = collect_pipe(child.stderr.take());
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| DownloadError::Internal("engine stdout not captured".to_string()))?;

        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut forwarded: u64 = 0;
        loop {
            let n = match stdout.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    let _ = tx.send(Err(io::Error::new(e.kind(), e.to_string()))).await;
                    return Err(e.into());
                }
            };

            if tx.send(Ok(Bytes::copy_from_slice(&buf[..n]))).await.is_err() {
                // receiver dropped: client went away
                tracing::info!(target: "engine", forwarded, "stream consumer gone, stopping engine");
                let _ = child.kill().await;
                stderr_task.abort();
                return Ok(());
            }
            forwarded += n as u64;
        }

        let status = child.wait().await?;
        let stderr = join_pipe(stderr_task).await?;
        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            let message = last_error_line(&stderr).to_string();
            tracing::warn!(target: "engine", forwarded, "stream fetch failed: {}", message);
            let _ = tx.send(Err(io::Error::new(io::ErrorKind::Other, message.clone()))).await;
            return Err(DownloadError::classify(message));
        }

        tracing::debug!(target: "engine", forwarded, "stream fetch complete");
        Ok(())
    }
}

impl Default for YtDlpCli {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[async_trait]
impl MediaEngine for YtDlpCli {
    fn name(&self) -> &'static str {
        "yt-dlp-cli"
    }

    async fn probe(&self, url: &str) -> Result<Option<MediaDescriptor>, DownloadError> {
        let args = self.probe_args(url);
        tracing::debug!(target: "engine", "{} {}", self.config.binary, args.join(" "));

        let out = run_output_with_timeout(&self.config.binary, args, self.config.timeout_seconds).await?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            tracing::debug!(target: "engine", stderr = %stderr, "probe failed");
            return Err(DownloadError::classify(last_error_line(&stderr)));
        }

        Self::parse_json(&out.stdout)
    }

    async fn fetch(
        &self,
        url: &str,
        format_id: &str,
        sink: FetchSink,
        on_progress: Option<ProgressCallback>,
    ) -> Result<(), DownloadError> {
        match sink {
            FetchSink::File(path) => self.fetch_to_file(url, format_id, &path, on_progress).await,
            FetchSink::Channel(tx) => self.fetch_to_channel(url, format_id, tx).await,
        }
    }
}

fn string_field(json: &Value, key: &str) -> Option<String> {
    json[key]
        .as_str()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}
