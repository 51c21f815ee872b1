// yt-dlp progress line parsing
//
// Works on `--newline` output, one status line per update:
// [download]   6.2% of ~ 343.72MiB at  420.30KiB/s ETA 12:32 (frag 29/454)
// [download] Destination: downloads/user_title_123.mp4
// [download] 100% of    3.41MiB in 00:00:01 at 2.38MiB/s

use regex::Regex;

use crate::downloader::models::TransferMetrics;

lazy_static::lazy_static! {
    static ref PROGRESS_RE: Regex = Regex::new(
        r"\[download\]\s+(\d+(?:\.\d+)?)%\s+of\s+~?\s*(\S+)(?:\s+at\s+(.+?/s))?(?:\s+ETA\s+(\S+))?"
    ).unwrap();
    static ref DEST_RE: Regex = Regex::new(r"\[download\]\s+Destination:\s+(.+)").unwrap();
    static ref ALREADY_RE: Regex = Regex::new(r"\[download\]\s+(.+?) has already been downloaded").unwrap();
}

/// Stateful parser: remembers the current target file between lines
#[derive(Debug, Default)]
pub struct ProgressParser {
    filename: Option<String>,
}

impl ProgressParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn parse_line(&mut self, line: &str) -> Option<TransferMetrics> {
        if let Some(caps) = DEST_RE.captures(line) {
            let filename = caps.get(1)?.as_str().trim().to_string();
            self.filename = Some(filename);
            return Some(self.metrics(0.0, None, None));
        }

        if let Some(caps) = ALREADY_RE.captures(line) {
            self.filename = Some(caps.get(1)?.as_str().trim().to_string());
            return Some(self.metrics(100.0, None, None));
        }

        let caps = PROGRESS_RE.captures(line)?;
        let percent: f32 = caps.get(1)?.as_str().parse().ok()?;
        let speed = caps
            .get(3)
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.starts_with("Unknown"));
        let eta = caps
            .get(4)
            .map(|m| m.as_str().to_string())
            .filter(|s| s != "Unknown");

        Some(self.metrics(percent, speed, eta))
    }

    fn metrics(&self, percent: f32, speed: Option<String>, eta: Option<String>) -> TransferMetrics {
        TransferMetrics {
            percent,
            speed,
            eta,
            filename: self.filename.clone(),
        }
    }
}
