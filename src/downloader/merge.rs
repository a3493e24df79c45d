// Assembly of separately fetched video and audio tracks into the final file

use std::path::Path;

use super::errors::DownloadError;
use super::models::MergeStrategy;
use super::utils::{remove_quietly, run_with_timeout};

/// Default wall-clock limit for one ffmpeg stream copy
pub const DEFAULT_MERGE_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Clone)]
pub struct TrackMerger {
    strategy: MergeStrategy,
    ffmpeg_path: String,
    timeout_secs: u64,
}

impl TrackMerger {
    pub fn new(strategy: MergeStrategy, ffmpeg_path: impl Into<String>) -> Self {
        Self {
            strategy,
            ffmpeg_path: ffmpeg_path.into(),
            timeout_secs: DEFAULT_MERGE_TIMEOUT_SECS,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn strategy(&self) -> MergeStrategy {
        self.strategy
    }

    /// Produce `output` from the two tracks.
    ///
    /// `output` should be a staging path: a failed ffmpeg run removes it.
    pub async fn assemble(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
    ) -> Result<(), DownloadError> {
        match self.strategy {
            MergeStrategy::VideoOnly => {
                tracing::warn!(
                    output = %output.display(),
                    "merge strategy is video-only: audio track discarded"
                );
                tokio::fs::rename(video, output).await?;
                Ok(())
            }
            MergeStrategy::Ffmpeg => self.mux_with_ffmpeg(video, audio, output).await,
        }
    }

    async fn mux_with_ffmpeg(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
    ) -> Result<(), DownloadError> {
        let args = ffmpeg_args(video, audio, output);
        tracing::debug!("[Merger] {} {}", self.ffmpeg_path, args.join(" "));

        let result = run_with_timeout(&self.ffmpeg_path, &args, self.timeout_secs).await;
        match result {
            Ok(out) if out.status.success() => Ok(()),
            Ok(out) => {
                remove_quietly(output);
                let stderr = String::from_utf8_lossy(&out.stderr);
                let last_line = stderr.lines().last().unwrap_or("").trim();
                Err(DownloadError::transfer(format!(
                    "ffmpeg exited with {}: {}",
                    out.status, last_line
                )))
            }
            Err(e) => {
                remove_quietly(output);
                Err(DownloadError::transfer(format!(
                    "could not merge audio and video: {} (install ffmpeg or set merge_strategy = \"video-only\")",
                    e
                )))
            }
        }
    }
}

/// Stream-copy the first video stream of `video` and the first audio stream of `audio`
pub fn ffmpeg_args(video: &Path, audio: &Path, output: &Path) -> Vec<String> {
    vec![
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-y".to_string(),
        "-i".to_string(),
        video.to_string_lossy().to_string(),
        "-i".to_string(),
        audio.to_string_lossy().to_string(),
        "-map".to_string(),
        "0:v:0".to_string(),
        "-map".to_string(),
        "1:a:0".to_string(),
        "-c".to_string(),
        "copy".to_string(),
        output.to_string_lossy().to_string(),
    ]
}
