//! Command-line interface: `serve` (default) and one-shot `download`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::{ServerConfig, DEFAULT_HOST, DEFAULT_OUTPUT_DIR, DEFAULT_PORT};
use crate::downloader::{
    url_validator, DownloadEvent, DownloadOrchestrator, EngineConfig, ErrorKind, JobStatus,
    JobStore, ProgressCallback, YtDlpCli,
};

#[derive(Debug, Parser)]
#[command(name = "twitter-downloader")]
#[command(about = "Download videos from Twitter/X posts", version)]
pub struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Path to the yt-dlp executable
    #[arg(long = "ytdlp", env = "YTDLP_PATH", global = true)]
    pub ytdlp: Option<String>,

    /// Proxy handed to yt-dlp
    #[arg(long, global = true)]
    pub proxy: Option<String>,

    /// cookies.txt handed to yt-dlp
    #[arg(long, global = true)]
    pub cookies: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP API
    Serve(ServeArgs),
    /// Download one post's video to disk
    Download(DownloadArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Directory for disk downloads
    #[arg(short, long, env = "DOWNLOAD_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// Metadata probe timeout in seconds
    #[arg(long, default_value_t = 60)]
    pub probe_timeout: u64,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            output: std::env::var("DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            probe_timeout: 60,
        }
    }
}

#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Twitter/X post URL
    pub url: String,

    /// Output directory
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// Format id to download (best available when omitted)
    #[arg(short, long)]
    pub format: Option<String>,
}

impl Cli {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_binary(self.ytdlp.clone())
            .with_proxy(self.proxy.clone())
            .with_cookies_path(self.cookies.clone())
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let engine_config = cli.engine_config();

    match cli.command {
        Some(Command::Download(args)) => run_download(args, engine_config).await,
        Some(Command::Serve(args)) => run_serve(args, engine_config).await,
        None => run_serve(ServeArgs::default(), engine_config).await,
    }
}

async fn run_serve(args: ServeArgs, engine: EngineConfig) -> Result<()> {
    let config = ServerConfig {
        host: args.host,
        port: args.port,
        output_dir: args.output,
        engine: engine.with_timeout(args.probe_timeout),
    };
    let engine = Arc::new(YtDlpCli::new(config.engine.clone()));
    crate::web::serve(config, engine).await
}

async fn run_download(args: DownloadArgs, engine: EngineConfig) -> Result<()> {
    if let Err(err) = url_validator::validate(&args.url) {
        eprintln!("Invalid Twitter URL format");
        eprintln!("Please provide a valid Twitter/X URL like:");
        eprintln!("  https://twitter.com/username/status/1234567890");
        eprintln!("  https://x.com/username/status/1234567890");
        return Err(anyhow!(err));
    }

    println!("Processing Twitter URL: {}", args.url);
    println!("Output directory: {}", args.output.display());

    let orchestrator = DownloadOrchestrator::new(
        Arc::new(YtDlpCli::new(engine)),
        Arc::new(JobStore::new()),
        args.output.clone(),
    );

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos}% ")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    let observer = progress_observer(bar.clone());

    let (_, outcome) = orchestrator
        .run(&args.url, args.format.as_deref(), Some(observer))
        .await;
    bar.finish_and_clear();

    match outcome {
        Ok(summary) => {
            println!("Video: {}", summary.title);
            println!("Author: {}", summary.uploader);
            if let Some(duration) = summary.duration {
                println!("Duration: {:.0} seconds", duration);
            }
            println!(
                "Format: {} ({})",
                summary.format_info.resolution, summary.format_info.format_id
            );
            println!("Saved to {}", summary.filepath);
            Ok(())
        }
        Err(err) => {
            eprintln!("{}: {}", err.kind().label(), err);
            match err.kind() {
                ErrorKind::PrivateOrProtected => {
                    eprintln!("This tweet might be from a private account")
                }
                ErrorKind::ContentNotFound => {
                    eprintln!("Tweet not found - it might have been deleted")
                }
                ErrorKind::NoVideoContent => {
                    eprintln!("This tweet might contain only images or text")
                }
                _ => {}
            }
            Err(anyhow!(err).context("download failed"))
        }
    }
}

fn progress_observer(bar: ProgressBar) -> ProgressCallback {
    Arc::new(move |event| match event {
        DownloadEvent::Status(status) => bar.set_message(status_line(status)),
        DownloadEvent::Progress(metrics) => {
            bar.set_position(metrics.percent.clamp(0.0, 100.0) as u64);
            if let Some(speed) = metrics.speed {
                let eta = metrics.eta.unwrap_or_else(|| "--:--".to_string());
                bar.set_message(format!("{speed} ETA {eta}"));
            }
        }
    })
}

fn status_line(status: JobStatus) -> String {
    match status {
        JobStatus::Extracting => "Extracting video information...",
        JobStatus::Downloading => "Starting download...",
        JobStatus::Finished => "Finalizing...",
        _ => "",
    }
    .to_string()
}
