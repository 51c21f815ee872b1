// Extraction engine adapters
//
// The only adapter drives the native `yt-dlp` binary. Anything else that
// implements `MediaEngine` can be plugged into the pipelines instead.

mod cli;
mod config;
mod progress;

pub use cli::{YtDlpCli, CHUNK_SIZE};
pub use config::EngineConfig;
pub use progress::ProgressParser;
