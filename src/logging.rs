// Structured logging: tracing subscriber writing to a file, stderr as fallback

use std::fs;
use std::path::PathBuf;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use crate::config::APP_DIR;

const DEFAULT_FILTER: &str = "info,tube_grabber_lib=debug";

/// Location of the log file: `<data_local_dir>/tube-grabber/tube-grabber.log`.
pub fn log_file_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join(APP_DIR).join("tube-grabber.log"))
}

fn open_log_file() -> Option<(fs::File, PathBuf)> {
    let path = log_file_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .ok()?;
    Some((file, path))
}

// Hands out clones of one file handle; falls back to stderr if cloning fails.
struct FileMakeWriter(fs::File);

impl<'a> MakeWriter<'a> for FileMakeWriter {
    type Writer = Box<dyn std::io::Write + 'a>;

    fn make_writer(&'a self) -> Self::Writer {
        match self.0.try_clone() {
            Ok(f) => Box::new(f),
            Err(_) => Box::new(std::io::stderr()),
        }
    }
}

/// Initialize structured logging.
///
/// Writes to the log file when it can be opened, otherwise to stderr.
/// `RUST_LOG` overrides the default filter. Calling this twice is harmless.
pub fn init_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    match open_log_file() {
        Some((file, path)) => {
            let writer = BoxMakeWriter::new(FileMakeWriter(file));
            let installed = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .is_ok();
            if installed {
                tracing::info!("tube-grabber logging initialized at {}", path.display());
            }
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .try_init();
            tracing::warn!("log file unavailable, logging to stderr");
        }
    }
}
