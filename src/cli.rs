// Terminal front-end: argument parsing, progress bar and command dispatch

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

use crate::config::{self, AppConfig};
use crate::downloader::{
    outcome_message, DownloadProgress, DownloadRequest, Downloader, FormatSelector,
    MergeStrategy, ProgressReporter, Resolution, ToolManager, ToolType, TrackMerger,
    VideoMetadata, YtDlpResolver,
};

#[derive(Debug, Parser)]
#[command(name = "tube-grabber", version)]
#[command(about = "Download a video at a chosen resolution")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Download a video into a directory
    Download {
        url: String,

        /// 144p, 240p, 360p, 480p, 720p or 1080p
        #[arg(short, long)]
        resolution: Option<Resolution>,

        /// Destination directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// How 1080p video and audio tracks are combined (ffmpeg or video-only)
        #[arg(long)]
        merge: Option<MergeStrategy>,

        /// HTTP or SOCKS5 proxy URL
        #[arg(long)]
        proxy: Option<String>,
    },
    /// Show title and available streams without downloading
    Info {
        url: String,

        #[arg(long)]
        proxy: Option<String>,
    },
    /// Report whether yt-dlp and ffmpeg are available
    Tools,
    /// Print the config file location and effective values
    Config,
}

/// Progress bar driven by the downloader's percentage updates
struct BarReporter {
    bar: ProgressBar,
}

impl BarReporter {
    fn new() -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template("[{elapsed_precise}] {wide_bar} {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-");
        bar.set_style(style);
        Self { bar }
    }
}

impl ProgressReporter for BarReporter {
    fn report(&self, progress: DownloadProgress) {
        self.bar.set_position(progress.percent.round() as u64);
        self.bar.set_message(progress.status);
    }
}

fn tool_manager(cfg: &AppConfig) -> ToolManager {
    ToolManager::with_overrides(cfg.tools.ytdlp_path.clone(), cfg.tools.ffmpeg_path.clone())
}

fn build_downloader(cfg: &AppConfig) -> Result<Downloader> {
    let tools = tool_manager(cfg);
    let resolver = YtDlpResolver::new(tools.binary_path(ToolType::YtDlp), cfg.network.clone())
        .context("building HTTP client")?
        .with_metadata_timeout(cfg.metadata_timeout_seconds);
    let merger = TrackMerger::new(cfg.merge_strategy, tools.binary_path(ToolType::Ffmpeg))
        .with_timeout(cfg.merge_timeout_seconds);
    Ok(Downloader::new(Box::new(resolver), merger))
}

fn print_metadata(metadata: &VideoMetadata) {
    println!("Title:    {}", metadata.title);
    if !metadata.uploader.is_empty() {
        println!("Uploader: {}", metadata.uploader);
    }
    if metadata.duration_seconds > 0 {
        let d = metadata.duration_seconds;
        println!("Duration: {}:{:02}:{:02}", d / 3600, (d % 3600) / 60, d % 60);
    }

    let available: Vec<&str> = FormatSelector::available_resolutions(&metadata.streams)
        .into_iter()
        .map(|r| r.as_str())
        .collect();
    if available.is_empty() {
        println!("Downloadable: none");
    } else {
        println!("Downloadable: {}", available.join(", "));
    }

    println!("Streams:");
    for s in &metadata.streams {
        let res = s.resolution.map(|r| r.as_str()).unwrap_or("-");
        let size = if s.byte_size > 0 {
            format!("{:.1} MiB", s.byte_size as f64 / (1024.0 * 1024.0))
        } else {
            "?".to_string()
        };
        println!(
            "  {:<8} {:<6} {:<5} {:<12} {}",
            s.format_id, res, s.container, s.kind, size
        );
    }
}

async fn dispatch(cli: Cli, mut cfg: AppConfig) -> Result<()> {
    match cli.command {
        Command::Download {
            url,
            resolution,
            output,
            merge,
            proxy,
        } => {
            if let Some(m) = merge {
                cfg.merge_strategy = m;
            }
            if proxy.is_some() {
                cfg.network.proxy = proxy;
            }
            let request = DownloadRequest::new(
                url,
                resolution.unwrap_or(cfg.default_resolution),
                output.unwrap_or_else(|| cfg.download_dir.clone()),
            );

            let downloader = build_downloader(&cfg)?;
            let reporter = BarReporter::new();
            let outcome = downloader.download(&request, &reporter).await;
            reporter.bar.finish_and_clear();

            let message = outcome_message(&outcome);
            match outcome {
                Ok(_) => {
                    println!("{}", message);
                    Ok(())
                }
                Err(e) => Err(anyhow::Error::new(e).context("download failed")),
            }
        }
        Command::Info { url, proxy } => {
            if proxy.is_some() {
                cfg.network.proxy = proxy;
            }
            let downloader = build_downloader(&cfg)?;
            let metadata = downloader.inspect(&url).await?;
            print_metadata(&metadata);
            Ok(())
        }
        Command::Tools => {
            for status in tool_manager(&cfg).status_all() {
                let name = status.tool.binary_name();
                match (&status.version, &status.path) {
                    (Some(version), Some(path)) => println!("{:<7} {} ({})", name, version, path),
                    _ => println!("{:<7} not found", name),
                }
            }
            Ok(())
        }
        Command::Config => {
            println!("# {}", config::config_path()?.display());
            print!("{}", toml::to_string_pretty(&cfg)?);
            Ok(())
        }
    }
}

/// Parse arguments, load config and run one command to completion.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    crate::logging::init_logging();

    let cfg = config::load_or_init()?;
    tracing::debug!(?cfg, "configuration loaded");

    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime.block_on(dispatch(cli, cfg))
}
