// Orchestrator: validate, resolve, select, fetch, assemble

use std::path::{Path, PathBuf};

use super::errors::DownloadError;
use super::format_selector::{FormatSelector, Selection};
use super::merge::TrackMerger;
use super::models::{DownloadOutcome, DownloadProgress, DownloadRequest, VideoMetadata};
use super::progress::ProgressTracker;
use super::traits::{ProgressReporter, StreamResolver};
use super::utils::output_path;

/// Prefix of the per-request scratch directory created under the destination
const SCRATCH_PREFIX: &str = ".tube-grabber-";

pub struct Downloader {
    resolver: Box<dyn StreamResolver>,
    merger: TrackMerger,
}

impl Downloader {
    pub fn new(resolver: Box<dyn StreamResolver>, merger: TrackMerger) -> Self {
        Self { resolver, merger }
    }

    /// Resolve a URL without downloading anything
    pub async fn inspect(&self, url: &str) -> Result<VideoMetadata, DownloadError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(DownloadError::missing_url());
        }
        tracing::debug!("[Downloader] Resolving {} with {}", url, self.resolver.name());
        Ok(self.resolver.resolve(url).await?)
    }

    /// Run one download to completion. Every failure is returned as a
    /// [`DownloadError`]; nothing here panics or retries.
    pub async fn download(
        &self,
        request: &DownloadRequest,
        reporter: &dyn ProgressReporter,
    ) -> DownloadOutcome {
        let outcome = self.run(request, reporter).await;

        match &outcome {
            Ok(path) => {
                tracing::info!(path = %path.display(), "[Downloader] ✓ Download finished");
                reporter.report(DownloadProgress::new(100.0, "Download complete"));
            }
            Err(e) => {
                tracing::warn!(url = %request.url, "[Downloader] ✗ Download failed: {}", e);
                reporter.report(DownloadProgress::new(0.0, "Error occurred"));
            }
        }

        outcome
    }

    async fn run(
        &self,
        request: &DownloadRequest,
        reporter: &dyn ProgressReporter,
    ) -> DownloadOutcome {
        request.validate()?;

        reporter.report(DownloadProgress::new(0.0, "Connecting..."));
        let metadata = self.inspect(request.url()).await?;
        reporter.report(DownloadProgress::new(
            0.0,
            format!("Downloading: {}", metadata.title),
        ));

        let selection = FormatSelector::select(&metadata.streams, request.resolution)?;
        tracing::debug!(resolution = %request.resolution, ?selection, "[Downloader] Selected streams");

        let destination = request.destination();
        tokio::fs::create_dir_all(destination).await.map_err(|e| {
            DownloadError::transfer(format!(
                "cannot create {}: {}",
                destination.display(),
                e
            ))
        })?;

        let final_path = output_path(destination, &metadata.title, selection.output_extension());

        // Everything is written under the scratch dir; only a finished file
        // is moved onto `final_path`.
        let scratch = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(destination)
            .map_err(|e| DownloadError::transfer(format!("cannot create temporary directory: {}", e)))?;

        let result = match self.stage(selection, scratch.path(), reporter).await {
            Ok(staged) => commit(&staged, &final_path).await,
            Err(e) => Err(e),
        };

        let scratch_path: PathBuf = scratch.path().to_path_buf();
        if let Err(e) = scratch.close() {
            tracing::debug!(path = %scratch_path.display(), error = %e, "scratch cleanup failed");
        }

        result.map(|()| final_path)
    }

    /// Fetch (and for split selections, assemble) into `scratch`; returns the staged file
    async fn stage(
        &self,
        selection: Selection<'_>,
        scratch: &Path,
        reporter: &dyn ProgressReporter,
    ) -> Result<PathBuf, DownloadError> {
        match selection {
            Selection::Progressive(stream) => {
                let target = scratch.join(format!("download.{}", stream.extension()));
                let mut tracker = ProgressTracker::new(reporter, stream.byte_size);
                self.resolver.fetch(stream, &target, &mut tracker).await?;
                Ok(target)
            }
            Selection::Split { video, audio } => {
                let video_path = scratch.join(format!("video.{}", video.extension()));
                let audio_path = scratch.join(format!("audio.{}", audio.extension()));
                let merged = scratch.join(format!("merged.{}", selection.output_extension()));

                let mut tracker =
                    ProgressTracker::new(reporter, video.byte_size).with_label("video track");
                self.resolver.fetch(video, &video_path, &mut tracker).await?;

                let mut tracker =
                    ProgressTracker::new(reporter, audio.byte_size).with_label("audio track");
                self.resolver.fetch(audio, &audio_path, &mut tracker).await?;

                reporter.report(DownloadProgress::new(
                    100.0,
                    format!("Merging audio and video ({})...", self.merger.strategy()),
                ));
                self.merger.assemble(&video_path, &audio_path, &merged).await?;
                Ok(merged)
            }
        }
    }
}

/// Move a finished file onto its final name, replacing any file already there.
async fn commit(staged: &Path, final_path: &Path) -> Result<(), DownloadError> {
    tokio::fs::rename(staged, final_path).await.map_err(|e| {
        DownloadError::transfer(format!("cannot move file to {}: {}", final_path.display(), e))
    })
}
