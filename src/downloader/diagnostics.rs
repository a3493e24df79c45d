// Turns resolver error text into a short reason the user can act on

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockingReason {
    /// Deleted, taken down or never existed
    VideoUnavailable,
    PrivateVideo,
    /// Needs a signed-in, age-verified account
    AgeRestricted,
    GeoBlocked,
    /// HTTP 429 / throttling
    RateLimited,
    /// HTTP 403 on the media URL
    Forbidden,
    NetworkTimeout,
}

// Checked in order; the first rule with a matching needle wins.
const RULES: &[(BlockingReason, &[&str])] = &[
    (
        BlockingReason::PrivateVideo,
        &["private video", "video is private"],
    ),
    (
        BlockingReason::VideoUnavailable,
        &[
            "video unavailable",
            "video is unavailable",
            "video has been removed",
            "no longer available",
        ],
    ),
    (
        BlockingReason::AgeRestricted,
        &["age-restricted", "confirm your age"],
    ),
    (
        BlockingReason::GeoBlocked,
        &["available in your country", "blocked in your country"],
    ),
    (
        BlockingReason::RateLimited,
        &["429", "too many requests", "rate limit"],
    ),
    (BlockingReason::Forbidden, &["403", "forbidden"]),
    (
        BlockingReason::NetworkTimeout,
        &["timed out", "timeout", "connection refused", "network unreachable"],
    ),
];

impl BlockingReason {
    pub fn description(&self) -> &'static str {
        match self {
            Self::VideoUnavailable => "the video was removed or is unavailable",
            Self::PrivateVideo => "the video is private",
            Self::AgeRestricted => "the video is age-restricted",
            Self::GeoBlocked => "the video is not available in your country",
            Self::RateLimited => "the host is rate-limiting requests, try again later",
            Self::Forbidden => "access to the media URL was denied",
            Self::NetworkTimeout => "the network connection timed out",
        }
    }

    /// Whether the same request may succeed if tried again later
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::Forbidden | Self::NetworkTimeout
        )
    }
}

/// Classify an error message, if any known pattern appears in it.
pub fn diagnose_error(message: &str) -> Option<BlockingReason> {
    let haystack = message.to_lowercase();
    RULES
        .iter()
        .find(|(_, needles)| needles.iter().any(|n| haystack.contains(n)))
        .map(|(reason, _)| *reason)
}
