// Error types: resolver-side failures and the closed orchestration-boundary enum

use thiserror::Error;

use super::diagnostics::diagnose_error;
use super::models::Resolution;

/// Failures surfaced by a stream resolver (metadata fetch or byte transfer).
///
/// These never leave the orchestrator: they are folded into
/// [`DownloadError::TransferFailure`] at the boundary.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// Network timeout while talking to the hosting platform
    #[error("network timeout: {0}")]
    NetworkTimeout(String),

    /// yt-dlp (or another helper binary) not found on this system
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// URL rejected by the resolver
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Resolver output could not be understood
    #[error("parse error: {0}")]
    ParseError(String),

    /// Helper process failed or exited non-zero
    #[error("execution error: {0}")]
    ExecutionError(String),

    /// HTTP-level failure during the byte transfer
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Local filesystem failure while writing the stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Unknown(String),
}

// Classifies raw helper stderr into a variant.
impl From<String> for ResolverError {
    fn from(s: String) -> Self {
        let lower = s.to_lowercase();

        if lower.contains("timeout") || lower.contains("timed out") {
            return Self::NetworkTimeout(s);
        }

        if lower.contains("command not found") || lower.contains("no such file") {
            return Self::ToolNotFound(s);
        }

        if lower.contains("invalid url")
            || lower.contains("unsupported url")
            || lower.contains("is not a valid url")
        {
            return Self::InvalidUrl(s);
        }

        if lower.contains("json") || lower.contains("parse") {
            return Self::ParseError(s);
        }

        Self::Unknown(s)
    }
}

/// The only error kinds a caller of the orchestrator ever sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownloadError {
    /// A required input (URL or destination) was empty
    #[error("please provide a {0}")]
    MissingInput(&'static str),

    /// No stream matches the requested resolution / kind
    #[error("no stream available for {resolution}: {detail}")]
    StreamUnavailable {
        resolution: Resolution,
        detail: String,
    },

    /// Anything the resolver, the filesystem or the merge step reported
    #[error("download failed: {0}")]
    TransferFailure(String),
}

impl DownloadError {
    pub fn missing_url() -> Self {
        Self::MissingInput("video URL")
    }

    pub fn missing_destination() -> Self {
        Self::MissingInput("save location")
    }

    pub fn unavailable(resolution: Resolution, detail: impl Into<String>) -> Self {
        Self::StreamUnavailable {
            resolution,
            detail: detail.into(),
        }
    }

    pub fn transfer(msg: impl Into<String>) -> Self {
        Self::TransferFailure(msg.into())
    }
}

impl From<ResolverError> for DownloadError {
    fn from(err: ResolverError) -> Self {
        let msg = err.to_string();
        match diagnose_error(&msg) {
            Some(reason) => {
                tracing::debug!(?reason, transient = reason.is_transient(), "diagnosed resolver failure");
                Self::TransferFailure(format!("{} ({})", msg, reason.description()))
            }
            None => Self::TransferFailure(msg),
        }
    }
}

impl From<std::io::Error> for DownloadError {
    fn from(err: std::io::Error) -> Self {
        Self::TransferFailure(err.to_string())
    }
}
