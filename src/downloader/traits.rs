// Seams between the orchestrator, the stream resolver and the presentation layer

use async_trait::async_trait;
use std::path::Path;

use super::errors::ResolverError;
use super::models::{DownloadProgress, StreamDescriptor, VideoMetadata};

/// Turns a URL into stream metadata and moves a stream's bytes to disk
#[async_trait]
pub trait StreamResolver: Send + Sync {
    /// Name of the resolver (for logging)
    fn name(&self) -> &'static str;

    /// Fetch title and available streams for a URL
    async fn resolve(&self, url: &str) -> Result<VideoMetadata, ResolverError>;

    /// Write one stream to `target`, calling `hooks` once per chunk and once
    /// on completion. Returns only after the transfer has finished.
    async fn fetch(
        &self,
        stream: &StreamDescriptor,
        target: &Path,
        hooks: &mut dyn TransferHooks,
    ) -> Result<(), ResolverError>;
}

/// Notifications the resolver fires from inside its transfer loop.
///
/// Implementations must not fail or panic.
pub trait TransferHooks: Send {
    /// Called once before the first chunk with the size the resolver will
    /// count down from; 0 when it is still unknown.
    fn on_start(&mut self, _total: u64) {}

    fn on_progress(&mut self, bytes_remaining: u64);

    fn on_complete(&mut self, path: &Path);
}

/// Receives percentage and status updates; implemented by whatever front-end is in use
pub trait ProgressReporter: Send + Sync {
    fn report(&self, progress: DownloadProgress);
}

impl<F> ProgressReporter for F
where
    F: Fn(DownloadProgress) + Send + Sync,
{
    fn report(&self, progress: DownloadProgress) {
        self(progress)
    }
}

/// Reporter that drops every update
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {
    fn report(&self, _progress: DownloadProgress) {}
}
