// FormatSelector - picks the stream(s) to fetch for a requested resolution
//
// Below the top tier the host serves progressive (audio+video) mp4 streams,
// so one stream is enough. At the top tier only separate video-only and
// audio-only streams exist, and both have to be fetched.
//
// Candidates are taken in the resolver's order; the first match wins.

use super::errors::DownloadError;
use super::models::{Resolution, StreamDescriptor, StreamKind};

/// What to fetch for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection<'a> {
    /// One stream that already carries audio and video
    Progressive(&'a StreamDescriptor),
    /// Separate tracks that have to be assembled afterwards
    Split {
        video: &'a StreamDescriptor,
        audio: &'a StreamDescriptor,
    },
}

impl Selection<'_> {
    /// Extension of the final output file
    pub fn output_extension(&self) -> &str {
        match self {
            Self::Progressive(stream) => stream.extension(),
            Self::Split { video, .. } => video.extension(),
        }
    }
}

pub struct FormatSelector;

impl FormatSelector {
    /// Apply the selection policy for `target`
    pub fn select(
        streams: &[StreamDescriptor],
        target: Resolution,
    ) -> Result<Selection<'_>, DownloadError> {
        if target.is_top_tier() {
            let video = Self::find_mp4(streams, StreamKind::VideoOnly, target);
            let audio = Self::find_audio(streams);

            match (video, audio) {
                (Some(video), Some(audio)) => Ok(Selection::Split { video, audio }),
                (None, _) => Err(DownloadError::unavailable(
                    target,
                    "no video-only mp4 stream at this resolution",
                )),
                (_, None) => Err(DownloadError::unavailable(target, "no audio-only stream")),
            }
        } else {
            Self::find_mp4(streams, StreamKind::Progressive, target)
                .map(Selection::Progressive)
                .ok_or_else(|| {
                    DownloadError::unavailable(target, "no progressive mp4 stream at this resolution")
                })
        }
    }

    /// Tiers for which `select` would succeed
    pub fn available_resolutions(streams: &[StreamDescriptor]) -> Vec<Resolution> {
        Resolution::ALL
            .into_iter()
            .filter(|r| Self::select(streams, *r).is_ok())
            .collect()
    }

    fn find_mp4(
        streams: &[StreamDescriptor],
        kind: StreamKind,
        target: Resolution,
    ) -> Option<&StreamDescriptor> {
        streams
            .iter()
            .find(|s| s.kind == kind && s.resolution == Some(target) && s.is_mp4())
    }

    fn find_audio(streams: &[StreamDescriptor]) -> Option<&StreamDescriptor> {
        streams.iter().find(|s| s.kind == StreamKind::AudioOnly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::models::SourceHandle;

    fn stream(id: &str, kind: StreamKind, res: Option<Resolution>, container: &str) -> StreamDescriptor {
        StreamDescriptor {
            format_id: id.to_string(),
            resolution: res,
            container: container.to_string(),
            kind,
            byte_size: 1_000,
            source: SourceHandle::new(format!("https://media.example/{}", id)),
        }
    }

    fn catalogue() -> Vec<StreamDescriptor> {
        vec![
            stream("137", StreamKind::VideoOnly, Some(Resolution::P1080), "mp4"),
            stream("248", StreamKind::VideoOnly, Some(Resolution::P1080), "webm"),
            stream("22", StreamKind::Progressive, Some(Resolution::P720), "mp4"),
            stream("43", StreamKind::Progressive, Some(Resolution::P360), "webm"),
            stream("18", StreamKind::Progressive, Some(Resolution::P360), "mp4"),
            stream("251", StreamKind::AudioOnly, None, "webm"),
            stream("140", StreamKind::AudioOnly, None, "m4a"),
        ]
    }

    #[test]
    fn progressive_below_top_tier() {
        let streams = catalogue();
        let sel = FormatSelector::select(&streams, Resolution::P360).unwrap();
        match sel {
            Selection::Progressive(s) => assert_eq!(s.format_id, "18"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(sel.output_extension(), "mp4");
    }

    #[test]
    fn top_tier_takes_first_video_and_first_audio() {
        let streams = catalogue();
        match FormatSelector::select(&streams, Resolution::P1080).unwrap() {
            Selection::Split { video, audio } => {
                assert_eq!(video.format_id, "137");
                // no container filter on audio: first in resolver order
                assert_eq!(audio.format_id, "251");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn video_only_streams_never_satisfy_lower_tiers() {
        let streams = vec![
            stream("136", StreamKind::VideoOnly, Some(Resolution::P720), "mp4"),
            stream("140", StreamKind::AudioOnly, None, "m4a"),
        ];
        let err = FormatSelector::select(&streams, Resolution::P720).unwrap_err();
        assert!(matches!(
            err,
            DownloadError::StreamUnavailable { resolution: Resolution::P720, .. }
        ));
    }

    #[test]
    fn top_tier_needs_both_tracks() {
        let no_audio: Vec<_> = catalogue()
            .into_iter()
            .filter(|s| s.kind != StreamKind::AudioOnly)
            .collect();
        assert!(FormatSelector::select(&no_audio, Resolution::P1080).is_err());

        let no_video: Vec<_> = catalogue()
            .into_iter()
            .filter(|s| s.format_id != "137")
            .collect();
        // the webm 1080p stream does not count
        assert!(FormatSelector::select(&no_video, Resolution::P1080).is_err());
    }

    #[test]
    fn progressive_1080p_is_ignored() {
        let streams = vec![
            stream("37", StreamKind::Progressive, Some(Resolution::P1080), "mp4"),
            stream("140", StreamKind::AudioOnly, None, "m4a"),
        ];
        assert!(FormatSelector::select(&streams, Resolution::P1080).is_err());
    }

    #[test]
    fn available_tiers() {
        let streams = catalogue();
        assert_eq!(
            FormatSelector::available_resolutions(&streams),
            vec![Resolution::P360, Resolution::P720, Resolution::P1080]
        );
        assert!(FormatSelector::available_resolutions(&[]).is_empty());
    }
}
