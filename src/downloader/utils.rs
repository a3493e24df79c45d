// Helper functions shared by the orchestrator and resolver implementations

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

use super::models::NetworkConfig;

/// Characters that are not allowed in file names on at least one major platform
const INVALID_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Base name used when a title sanitizes down to nothing
const FALLBACK_BASE_NAME: &str = "video";

/// Remove characters that are invalid in file names, then trim whitespace.
///
/// Idempotent. Makes no attempt to avoid collisions with existing files.
pub fn sanitize_filename(title: &str) -> String {
    title
        .chars()
        .filter(|c| !INVALID_FILENAME_CHARS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// `<sanitized-title>.<ext>`, falling back to `video.<ext>` for empty titles
pub fn output_file_name(title: &str, ext: &str) -> String {
    let base = sanitize_filename(title);
    let base = if base.is_empty() {
        FALLBACK_BASE_NAME
    } else {
        base.as_str()
    };
    format!("{}.{}", base, ext)
}

pub fn output_path(destination: &Path, title: &str, ext: &str) -> PathBuf {
    destination.join(output_file_name(title, ext))
}

/// Best-effort removal of a file; errors are logged and swallowed.
pub fn remove_quietly(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::debug!(path = %path.display(), error = %e, "cleanup failed");
        }
    }
}

/// Run a helper binary to completion and capture its output.
///
/// The child is killed if it outlives `timeout_secs`. Failures come back as
/// plain text so the resolver can classify them.
pub async fn run_with_timeout(
    program: &str,
    args: &[String],
    timeout_secs: u64,
) -> Result<Output, String> {
    let child = TokioCommand::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| format!("failed to start {}: {}", program, e))?;

    // dropping the wait future on timeout kills the child
    match timeout(Duration::from_secs(timeout_secs), child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(format!("{} did not finish cleanly: {}", program, e)),
        Err(_) => Err(format!("{} timed out after {}s", program, timeout_secs)),
    }
}

/// Build an HTTP client honouring the proxy and connect timeout
pub fn build_http_client(config: &NetworkConfig) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder().user_agent(
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    );

    if let Some(secs) = config.timeout {
        builder = builder.connect_timeout(Duration::from_secs(secs as u64));
    }

    if let Some(proxy_url) = config.proxy.as_deref() {
        builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
    }

    builder.build()
}

/// `--socket-timeout` and `--proxy` flags for yt-dlp
pub fn network_args(config: &NetworkConfig) -> Vec<String> {
    let mut args = Vec::with_capacity(4);
    if let Some(secs) = config.timeout {
        args.extend(["--socket-timeout".to_string(), secs.to_string()]);
    }
    if let Some(proxy) = config.proxy.as_deref() {
        args.extend(["--proxy".to_string(), proxy.to_string()]);
    }
    args
}
