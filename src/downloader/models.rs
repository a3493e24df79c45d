// Common data models for the downloader

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::errors::DownloadError;

/// Resolution tiers a user can pick.
///
/// Ordered ascending, so `Resolution::ALL.last()` is the top tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "144p")]
    P144,
    #[serde(rename = "240p")]
    P240,
    #[serde(rename = "360p")]
    P360,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "1080p")]
    P1080,
}

impl Resolution {
    pub const ALL: [Resolution; 6] = [
        Self::P144,
        Self::P240,
        Self::P360,
        Self::P480,
        Self::P720,
        Self::P1080,
    ];

    /// The host does not serve progressive (audio+video) streams at this tier.
    pub const TOP_TIER: Resolution = Self::P1080;

    pub fn is_top_tier(&self) -> bool {
        *self == Self::TOP_TIER
    }

    pub fn height(&self) -> u32 {
        match self {
            Self::P144 => 144,
            Self::P240 => 240,
            Self::P360 => 360,
            Self::P480 => 480,
            Self::P720 => 720,
            Self::P1080 => 1080,
        }
    }

    /// Map an exact pixel height onto a tier
    pub fn from_height(height: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.height() == height)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::P144 => "144p",
            Self::P240 => "240p",
            Self::P360 => "360p",
            Self::P480 => "480p",
            Self::P720 => "720p",
            Self::P1080 => "1080p",
        }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::P720
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == wanted)
            .ok_or_else(|| {
                let labels: Vec<&str> = Self::ALL.iter().map(|r| r.as_str()).collect();
                format!("unknown resolution '{}' (expected one of {})", s, labels.join(", "))
            })
    }
}

/// What a stream carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// Audio and video already combined by the host
    Progressive,
    VideoOnly,
    AudioOnly,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Progressive => write!(f, "progressive"),
            Self::VideoOnly => write!(f, "video-only"),
            Self::AudioOnly => write!(f, "audio-only"),
        }
    }
}

/// Opaque handle the resolver uses to fetch a stream's bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceHandle(String);

impl SourceHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One downloadable stream as reported by the resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDescriptor {
    /// Resolver-side identifier (e.g. yt-dlp format id "137")
    pub format_id: String,
    /// None for audio-only streams
    pub resolution: Option<Resolution>,
    /// Container / file extension, e.g. "mp4"
    pub container: String,
    pub kind: StreamKind,
    /// Size in bytes; 0 when the host did not report it
    pub byte_size: u64,
    pub source: SourceHandle,
}

impl StreamDescriptor {
    pub fn is_mp4(&self) -> bool {
        self.container.eq_ignore_ascii_case("mp4")
    }

    pub fn extension(&self) -> &str {
        &self.container
    }
}

/// Title and streams of one resolved video
#[derive(Debug, Clone)]
pub struct VideoMetadata {
    pub id: String,
    pub title: String,
    pub uploader: String,
    pub duration_seconds: u64,
    pub streams: Vec<StreamDescriptor>,
}

/// What the user asked for
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub resolution: Resolution,
    pub destination: PathBuf,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, resolution: Resolution, destination: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            resolution,
            destination: destination.into(),
        }
    }

    /// Both URL and destination must be present before anything is attempted.
    pub fn validate(&self) -> Result<(), DownloadError> {
        if self.url.trim().is_empty() {
            return Err(DownloadError::missing_url());
        }
        if self.destination.as_os_str().is_empty() {
            return Err(DownloadError::missing_destination());
        }
        Ok(())
    }

    pub fn url(&self) -> &str {
        self.url.trim()
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }
}

/// Either the single output file or the reason there is none
pub type DownloadOutcome = Result<PathBuf, DownloadError>;

/// Terminal message for the presentation layer
pub fn outcome_message(outcome: &DownloadOutcome) -> String {
    match outcome {
        Ok(path) => format!(
            "Video downloaded successfully!\nSaved as: {}",
            path.display()
        ),
        Err(err) => format!("An error occurred: {}", err),
    }
}

/// Download progress information
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadProgress {
    /// 0.0 ..= 100.0
    pub percent: f32,
    pub status: String,
}

impl DownloadProgress {
    pub fn new(percent: f32, status: impl Into<String>) -> Self {
        Self {
            percent,
            status: status.into(),
        }
    }
}

/// How the top-tier video and audio tracks become one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeStrategy {
    /// Stream-copy both tracks into one container with ffmpeg
    #[default]
    Ffmpeg,
    /// Keep only the video track; the result has no audio
    VideoOnly,
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ffmpeg => write!(f, "ffmpeg"),
            Self::VideoOnly => write!(f, "video-only"),
        }
    }
}

impl FromStr for MergeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ffmpeg" => Ok(Self::Ffmpeg),
            "video-only" | "video_only" => Ok(Self::VideoOnly),
            other => Err(format!(
                "unknown merge strategy '{}' (expected ffmpeg or video-only)",
                other
            )),
        }
    }
}

/// Network configuration for the resolver
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// HTTP or SOCKS5 proxy URL (e.g., "socks5://127.0.0.1:1080")
    pub proxy: Option<String>,

    /// Connect timeout in seconds
    pub timeout: Option<u32>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            timeout: Some(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_labels_roundtrip() {
        for r in Resolution::ALL {
            assert_eq!(r.as_str().parse::<Resolution>().unwrap(), r);
        }
        assert!("2160p".parse::<Resolution>().is_err());
        assert_eq!(" 720P ".parse::<Resolution>().unwrap(), Resolution::P720);
    }

    #[test]
    fn only_1080p_is_top_tier() {
        let top: Vec<Resolution> = Resolution::ALL
            .into_iter()
            .filter(|r| r.is_top_tier())
            .collect();
        assert_eq!(top, vec![Resolution::P1080]);
        assert_eq!(Resolution::ALL.last(), Some(&Resolution::TOP_TIER));
    }

    #[test]
    fn from_height_exact_only() {
        assert_eq!(Resolution::from_height(480), Some(Resolution::P480));
        assert_eq!(Resolution::from_height(1440), None);
        assert_eq!(Resolution::from_height(470), None);
    }

    #[test]
    fn request_validation() {
        let ok = DownloadRequest::new("https://youtu.be/x", Resolution::P360, "/tmp");
        assert!(ok.validate().is_ok());

        let no_url = DownloadRequest::new("   ", Resolution::P360, "/tmp");
        assert_eq!(no_url.validate(), Err(DownloadError::missing_url()));

        let no_dest = DownloadRequest::new("https://youtu.be/x", Resolution::P360, "");
        assert_eq!(no_dest.validate(), Err(DownloadError::missing_destination()));
    }

    #[test]
    fn merge_strategy_parsing() {
        assert_eq!("ffmpeg".parse::<MergeStrategy>().unwrap(), MergeStrategy::Ffmpeg);
        assert_eq!(
            "video-only".parse::<MergeStrategy>().unwrap(),
            MergeStrategy::VideoOnly
        );
        assert!("mkvmerge".parse::<MergeStrategy>().is_err());
    }

    #[test]
    fn outcome_messages() {
        let ok: DownloadOutcome = Ok(PathBuf::from("/videos/Clip.mp4"));
        assert_eq!(
            outcome_message(&ok),
            "Video downloaded successfully!\nSaved as: /videos/Clip.mp4"
        );

        let err: DownloadOutcome = Err(DownloadError::missing_destination());
        assert_eq!(
            outcome_message(&err),
            "An error occurred: please provide a save location"
        );
    }
}
