// yt-dlp backed resolver
//
// Metadata: `yt-dlp --dump-json` in a subprocess, formats classified into
// stream descriptors. Bytes: plain HTTP(S) GET of each format's direct URL.

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::path::Path;
use tokio::io::AsyncWriteExt;

use crate::downloader::errors::ResolverError;
use crate::downloader::models::{
    NetworkConfig, Resolution, SourceHandle, StreamDescriptor, StreamKind, VideoMetadata,
};
use crate::downloader::traits::{StreamResolver, TransferHooks};
use crate::downloader::utils::{build_http_client, network_args, run_with_timeout};

pub const DEFAULT_METADATA_TIMEOUT_SECS: u64 = 60;

lazy_static::lazy_static! {
    // format_note like "1080p", "720p60", "480p HDR"
    static ref QUALITY_LABEL_RE: Regex = Regex::new(r"^(\d{3,4})p").unwrap();
}

pub struct YtDlpResolver {
    ytdlp_bin: String,
    network: NetworkConfig,
    metadata_timeout_secs: u64,
    client: reqwest::Client,
}

impl YtDlpResolver {
    pub fn new(ytdlp_bin: impl Into<String>, network: NetworkConfig) -> Result<Self, ResolverError> {
        let client = build_http_client(&network)?;
        Ok(Self::with_client(ytdlp_bin, network, client))
    }

    pub fn with_client(
        ytdlp_bin: impl Into<String>,
        network: NetworkConfig,
        client: reqwest::Client,
    ) -> Self {
        Self {
            ytdlp_bin: ytdlp_bin.into(),
            network,
            metadata_timeout_secs: DEFAULT_METADATA_TIMEOUT_SECS,
            client,
        }
    }

    pub fn with_metadata_timeout(mut self, secs: u64) -> Self {
        self.metadata_timeout_secs = secs;
        self
    }

    fn build_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "--dump-json".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
        ];
        args.extend(network_args(&self.network));
        args.push(url.to_string());
        args
    }
}

#[async_trait]
impl StreamResolver for YtDlpResolver {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn resolve(&self, url: &str) -> Result<VideoMetadata, ResolverError> {
        let args = self.build_args(url);
        tracing::debug!("[yt-dlp] {} {}", self.ytdlp_bin, args.join(" "));

        let output = run_with_timeout(&self.ytdlp_bin, &args, self.metadata_timeout_secs)
            .await
            .map_err(ResolverError::from)?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return Err(error.trim().to_string().into());
        }

        let metadata = parse_metadata(&output.stdout)?;
        tracing::info!(
            id = %metadata.id,
            streams = metadata.streams.len(),
            "resolved \"{}\"",
            metadata.title
        );
        Ok(metadata)
    }

    async fn fetch(
        &self,
        stream: &StreamDescriptor,
        target: &Path,
        hooks: &mut dyn TransferHooks,
    ) -> Result<(), ResolverError> {
        let mut response = self
            .client
            .get(stream.source.as_str())
            .send()
            .await?
            .error_for_status()?;

        let total = if stream.byte_size > 0 {
            stream.byte_size
        } else {
            response.content_length().unwrap_or(0)
        };
        tracing::debug!(
            format_id = %stream.format_id,
            total,
            target = %target.display(),
            "starting transfer"
        );

        hooks.on_start(total);
        let mut file = tokio::fs::File::create(target).await?;
        let mut downloaded: u64 = 0;

        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
            hooks.on_progress(total.saturating_sub(downloaded));
        }

        file.flush().await?;
        drop(file);

        hooks.on_complete(target);
        Ok(())
    }
}

/// Parse `--dump-json` output into metadata; streams are returned best-first.
pub fn parse_metadata(stdout: &[u8]) -> Result<VideoMetadata, ResolverError> {
    let json_str = String::from_utf8_lossy(stdout);
    let json: Value = serde_json::from_str(&json_str)
        .map_err(|e| ResolverError::ParseError(format!("Invalid JSON: {}", e)))?;

    let formats = json["formats"]
        .as_array()
        .ok_or_else(|| ResolverError::ParseError("No formats array in JSON".to_string()))?;

    // yt-dlp lists formats worst-first
    let streams: Vec<StreamDescriptor> = formats.iter().rev().filter_map(classify_format).collect();

    Ok(VideoMetadata {
        id: json["id"].as_str().unwrap_or("unknown").to_string(),
        title: json["title"].as_str().unwrap_or("Unknown").to_string(),
        uploader: json["uploader"].as_str().unwrap_or("Unknown").to_string(),
        duration_seconds: json["duration"].as_f64().unwrap_or(0.0) as u64,
        streams,
    })
}

/// One yt-dlp format entry -> descriptor. Manifests, storyboards and
/// entries without a direct URL are skipped.
fn classify_format(f: &Value) -> Option<StreamDescriptor> {
    let url = f["url"].as_str()?;
    if let Some(protocol) = f["protocol"].as_str() {
        if protocol != "https" && protocol != "http" {
            return None;
        }
    }

    let has_codec = |key: &str| {
        f[key]
            .as_str()
            .map_or(false, |c| c != "none" && !c.is_empty())
    };
    let has_video = has_codec("vcodec");
    let has_audio = has_codec("acodec");

    let kind = match (has_video, has_audio) {
        (true, true) => StreamKind::Progressive,
        (true, false) => StreamKind::VideoOnly,
        (false, true) => StreamKind::AudioOnly,
        (false, false) => return None,
    };

    let resolution = if kind == StreamKind::AudioOnly {
        None
    } else {
        f["height"]
            .as_u64()
            .and_then(|h| Resolution::from_height(h as u32))
            .or_else(|| f["format_note"].as_str().and_then(resolution_from_label))
    };

    Some(StreamDescriptor {
        format_id: f["format_id"].as_str().unwrap_or("").to_string(),
        resolution,
        container: f["ext"].as_str().unwrap_or("").to_string(),
        kind,
        byte_size: f["filesize"]
            .as_u64()
            .or_else(|| f["filesize_approx"].as_u64())
            .unwrap_or(0),
        source: SourceHandle::new(url),
    })
}

fn resolution_from_label(label: &str) -> Option<Resolution> {
    let caps = QUALITY_LABEL_RE.captures(label.trim())?;
    let height: u32 = caps.get(1)?.as_str().parse().ok()?;
    Resolution::from_height(height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    const SAMPLE: &str = r#"{
        "id": "abc123",
        "title": "My:Video/Clip?",
        "uploader": "someone",
        "duration": 212.0,
        "formats": [
            {"format_id": "sb0", "ext": "mhtml", "protocol": "mhtml", "url": "https://i.example/sb", "vcodec": "none", "acodec": "none"},
            {"format_id": "139", "ext": "m4a", "protocol": "https", "url": "https://m.example/139", "vcodec": "none", "acodec": "mp4a.40.5", "filesize": 1200},
            {"format_id": "140", "ext": "m4a", "protocol": "https", "url": "https://m.example/140", "vcodec": "none", "acodec": "mp4a.40.2", "filesize": 3400},
            {"format_id": "18", "ext": "mp4", "protocol": "https", "url": "https://m.example/18", "vcodec": "avc1.42001E", "acodec": "mp4a.40.2", "height": 360, "filesize_approx": 9000},
            {"format_id": "136", "ext": "mp4", "protocol": "https", "url": "https://m.example/136", "vcodec": "avc1.4d401f", "acodec": "none", "height": 720},
            {"format_id": "96", "ext": "mp4", "protocol": "m3u8_native", "url": "https://m.example/96.m3u8", "vcodec": "avc1.640028", "acodec": "mp4a.40.2", "height": 1080},
            {"format_id": "137", "ext": "mp4", "protocol": "https", "url": "https://m.example/137", "vcodec": "avc1.640028", "acodec": "none", "format_note": "1080p", "filesize": 50000}
        ]
    }"#;

    #[test]
    fn parses_and_classifies_formats() {
        let meta = parse_metadata(SAMPLE.as_bytes()).unwrap();
        assert_eq!(meta.title, "My:Video/Clip?");
        assert_eq!(meta.duration_seconds, 212);

        let ids: Vec<&str> = meta.streams.iter().map(|s| s.format_id.as_str()).collect();
        // best-first, manifest and storyboard dropped
        assert_eq!(ids, vec!["137", "136", "18", "140", "139"]);

        let s137 = &meta.streams[0];
        assert_eq!(s137.kind, StreamKind::VideoOnly);
        assert_eq!(s137.resolution, Some(Resolution::P1080));
        assert_eq!(s137.byte_size, 50000);

        let s18 = &meta.streams[2];
        assert_eq!(s18.kind, StreamKind::Progressive);
        assert_eq!(s18.resolution, Some(Resolution::P360));
        assert_eq!(s18.byte_size, 9000);

        let s140 = &meta.streams[3];
        assert_eq!(s140.kind, StreamKind::AudioOnly);
        assert_eq!(s140.resolution, None);
        assert_eq!(s140.source.as_str(), "https://m.example/140");
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            parse_metadata(b"not json"),
            Err(ResolverError::ParseError(_))
        ));
        assert!(matches!(
            parse_metadata(br#"{"title": "x"}"#),
            Err(ResolverError::ParseError(_))
        ));
    }

    #[test]
    fn quality_labels() {
        assert_eq!(resolution_from_label("720p60"), Some(Resolution::P720));
        assert_eq!(resolution_from_label("1440p"), None);
        assert_eq!(resolution_from_label("tiny"), None);
    }

    #[test]
    fn ytdlp_args_include_network_settings() {
        let network = NetworkConfig {
            proxy: Some("http://127.0.0.1:8080".to_string()),
            timeout: Some(20),
        };
        let resolver =
            YtDlpResolver::with_client("yt-dlp", network, reqwest::Client::new());
        let args = resolver.build_args("https://youtu.be/abc123");
        assert_eq!(args[0], "--dump-json");
        assert!(args.windows(2).any(|w| w[0] == "--proxy" && w[1] == "http://127.0.0.1:8080"));
        assert!(args.windows(2).any(|w| w[0] == "--socket-timeout" && w[1] == "20"));
        assert_eq!(args.last().unwrap(), "https://youtu.be/abc123");
    }

    #[derive(Default)]
    struct Hooks {
        started: Option<u64>,
        remaining: Vec<u64>,
        completed: Option<PathBuf>,
    }

    impl TransferHooks for Hooks {
        fn on_start(&mut self, total: u64) {
            self.started = Some(total);
        }

        fn on_progress(&mut self, bytes_remaining: u64) {
            self.remaining.push(bytes_remaining);
        }

        fn on_complete(&mut self, path: &Path) {
            self.completed = Some(path.to_path_buf());
        }
    }

    async fn serve_once(body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let mut request = Vec::new();
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if n == 0 || request.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: video/mp4\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{}/media", addr)
    }

    #[tokio::test]
    async fn fetch_streams_bytes_to_disk() {
        let body: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let url = serve_once(body.clone()).await;

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let resolver = YtDlpResolver::with_client("yt-dlp", NetworkConfig::default(), client);
        let stream = StreamDescriptor {
            format_id: "18".to_string(),
            resolution: Some(Resolution::P360),
            container: "mp4".to_string(),
            kind: StreamKind::Progressive,
            byte_size: 0,
            source: SourceHandle::new(url),
        };

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.mp4");
        let mut hooks = Hooks::default();
        resolver.fetch(&stream, &target, &mut hooks).await.unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), body);
        assert_eq!(hooks.started, Some(body.len() as u64));
        assert_eq!(hooks.remaining.last(), Some(&0));
        assert!(hooks.remaining.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(hooks.completed.as_deref(), Some(target.as_path()));
    }

    #[tokio::test]
    async fn unknown_size_progress_uses_content_length() {
        use crate::downloader::models::DownloadProgress;
        use crate::downloader::progress::ProgressTracker;
        use std::sync::Mutex;

        let body = vec![7u8; 300_000];
        let url = serve_once(body).await;

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        let resolver = YtDlpResolver::with_client("yt-dlp", NetworkConfig::default(), client);
        let stream = StreamDescriptor {
            format_id: "22".to_string(),
            resolution: Some(Resolution::P720),
            container: "mp4".to_string(),
            kind: StreamKind::Progressive,
            byte_size: 0,
            source: SourceHandle::new(url),
        };

        let seen = Mutex::new(Vec::<DownloadProgress>::new());
        let reporter = |p: DownloadProgress| seen.lock().unwrap().push(p);
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = ProgressTracker::new(&reporter, stream.byte_size);
        resolver
            .fetch(&stream, &dir.path().join("out.mp4"), &mut tracker)
            .await
            .unwrap();

        let seen = seen.into_inner().unwrap();
        // the last chunk reports 100% before the completion update
        let chunks = &seen[..seen.len() - 1];
        assert_eq!(chunks.last().map(|p| p.percent), Some(100.0));
        assert_eq!(
            chunks.last().map(|p| p.status.as_str()),
            Some("Downloading: 100.00%")
        );
    }
}
