// Helper functions shared by the engine and the pipeline

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command as TokioCommand;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};

use super::errors::DownloadError;
use super::models::{FormatVariant, MediaDescriptor};

/// Longest title kept in generated file names (in characters)
pub const MAX_TITLE_CHARS: usize = 100;

/// Run command with timeout, collecting stdout and stderr
pub async fn run_output_with_timeout(
    program: &str,
    args: Vec<String>,
    timeout_secs: u64,
) -> Result<std::process::Output, DownloadError> {
    let mut child = TokioCommand::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| DownloadError::Internal(format!("Failed to start {}: {}", program, e)))?;

    let stdout_task = collect_pipe(child.stdout.take());
    let stderr_task = collect_pipe(child.stderr.take());

    let waited = timeout(Duration::from_secs(timeout_secs), child.wait()).await;
    match waited {
        Ok(status_res) => {
            let status = status_res
                .map_err(|e| DownloadError::Internal(format!("Failed to wait for {}: {}", program, e)))?;
            let stdout = join_pipe(stdout_task).await?;
            let stderr = join_pipe(stderr_task).await?;
            Ok(std::process::Output { status, stdout, stderr })
        }
        Err(_) => {
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            Err(DownloadError::EngineFailure(format!(
                "{} timed out after {}s",
                program, timeout_secs
            )))
        }
    }
}

/// Drain a child pipe on its own task so the child never blocks on a full pipe
pub fn collect_pipe<R>(pipe: Option<R>) -> JoinHandle<std::io::Result<Vec<u8>>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf).await?;
        }
        Ok(buf)
    })
}

pub async fn join_pipe(
    task: JoinHandle<std::io::Result<Vec<u8>>>,
) -> Result<Vec<u8>, DownloadError> {
    task.await
        .map_err(|e| DownloadError::Internal(format!("pipe reader failed: {}", e)))?
        .map_err(DownloadError::from)
}

/// Find yt-dlp executable: explicit override, common paths, then PATH
pub fn find_ytdlp() -> String {
    if let Ok(path) = std::env::var("YTDLP_PATH") {
        if !path.trim().is_empty() {
            return path;
        }
    }

    let common_paths = [
        "/opt/homebrew/bin/yt-dlp", // Homebrew on Apple Silicon
        "/usr/local/bin/yt-dlp",    // Homebrew on Intel Mac, pip --user installs
        "/usr/bin/yt-dlp",          // System installation
    ];

    for path in common_paths {
        if Path::new(path).exists() {
            return path.to_string();
        }
    }

    // Last resort: hope it's in PATH
    "yt-dlp".to_string()
}

/// Replace characters that are illegal in file names and cap the length
pub fn sanitize_filename(name: &str, max_chars: usize) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .take(max_chars)
        .collect()
}

/// On-disk target: `<uploader>_<title>_<id>.<ext>` inside `output_dir`
pub fn output_path(output_dir: &Path, info: &MediaDescriptor, variant: &FormatVariant) -> PathBuf {
    let ext = if variant.ext.is_empty() { "mp4" } else { variant.ext.as_str() };
    let name = format!(
        "{}_{}_{}.{}",
        sanitize_filename(&info.uploader, MAX_TITLE_CHARS),
        sanitize_filename(&info.title, MAX_TITLE_CHARS),
        sanitize_filename(&info.id, MAX_TITLE_CHARS),
        sanitize_filename(ext, 16),
    );
    output_dir.join(name)
}

/// Attachment name for streamed responses: `<title>_<resolution>.<ext>`
pub fn stream_filename(info: &MediaDescriptor, variant: &FormatVariant) -> String {
    let title = if info.title.trim().is_empty() {
        "twitter_video"
    } else {
        info.title.as_str()
    };
    let ext = if variant.ext.is_empty() { "mp4" } else { variant.ext.as_str() };
    format!(
        "{}_{}.{}",
        sanitize_filename(title, MAX_TITLE_CHARS),
        sanitize_filename(&variant.resolution_label(), 32),
        sanitize_filename(ext, 16),
    )
}

/// Last non-empty line of engine stderr, for short log messages
pub fn last_error_line(stderr: &str) -> &str {
    stderr
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| l.starts_with("ERROR:"))
        .or_else(|| stderr.lines().rev().map(str::trim).find(|l| !l.is_empty()))
        .unwrap_or("Unknown error")
}
