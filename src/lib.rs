//! Twitter/X post video downloader: URL validation, format selection,
//! tracked disk downloads and pass-through streaming over an external
//! extraction engine (yt-dlp).

pub mod cli;
pub mod config;
pub mod downloader;
pub mod logging;
pub mod web;

pub use config::ServerConfig;
pub use downloader::{DownloadError, DownloadOrchestrator, JobStore, MediaEngine, StreamingProxy};
