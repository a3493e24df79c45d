// Locating the external helper binaries (yt-dlp for metadata, ffmpeg for merging)

use std::path::Path;
use std::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolType {
    YtDlp,
    Ffmpeg,
}

impl ToolType {
    pub const ALL: [ToolType; 2] = [ToolType::YtDlp, ToolType::Ffmpeg];

    pub fn binary_name(&self) -> &'static str {
        match self {
            Self::YtDlp => "yt-dlp",
            Self::Ffmpeg => "ffmpeg",
        }
    }

    fn version_flag(&self) -> &'static str {
        match self {
            Self::YtDlp => "--version",
            Self::Ffmpeg => "-version",
        }
    }
}

/// Result of probing one helper binary
#[derive(Debug, Clone)]
pub struct ToolStatus {
    pub tool: ToolType,
    pub path: Option<String>,
    /// First line of the `--version` output; `None` if the binary did not run
    pub version: Option<String>,
}

impl ToolStatus {
    pub fn is_available(&self) -> bool {
        self.version.is_some()
    }
}

/// Well-known install locations checked before `PATH`
const SEARCH_DIRS: &[&str] = &["/opt/homebrew/bin", "/usr/local/bin", "/usr/bin"];

/// Resolves tool paths: configured override first, then well-known install
/// locations, then `PATH`.
#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    ytdlp_override: Option<String>,
    ffmpeg_override: Option<String>,
}

impl ToolManager {
    pub fn with_overrides(ytdlp: Option<String>, ffmpeg: Option<String>) -> Self {
        Self {
            ytdlp_override: ytdlp,
            ffmpeg_override: ffmpeg,
        }
    }

    /// Path to run; falls back to the bare binary name so the OS error surfaces later
    pub fn binary_path(&self, tool: ToolType) -> String {
        self.locate(tool)
            .unwrap_or_else(|| tool.binary_name().to_string())
    }

    pub fn status(&self, tool: ToolType) -> ToolStatus {
        let path = self.locate(tool);
        let version = path.as_deref().and_then(|p| probe_version(p, tool));
        ToolStatus { tool, path, version }
    }

    pub fn status_all(&self) -> Vec<ToolStatus> {
        ToolType::ALL.into_iter().map(|t| self.status(t)).collect()
    }

    fn locate(&self, tool: ToolType) -> Option<String> {
        let configured = match tool {
            ToolType::YtDlp => self.ytdlp_override.as_deref(),
            ToolType::Ffmpeg => self.ffmpeg_override.as_deref(),
        };
        if let Some(path) = configured {
            return Some(path.to_string());
        }

        let name = tool.binary_name();
        SEARCH_DIRS
            .iter()
            .map(|dir| Path::new(dir).join(name))
            .find(|candidate| candidate.is_file())
            .map(|p| p.to_string_lossy().into_owned())
            .or_else(|| which(name))
    }
}

fn which(name: &str) -> Option<String> {
    let finder = if cfg!(windows) { "where" } else { "which" };
    let output = Command::new(finder).arg(name).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

// ffmpeg prints a multi-line banner; the first line carries the version.
fn probe_version(path: &str, tool: ToolType) -> Option<String> {
    let output = Command::new(path).arg(tool.version_flag()).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|l| l.trim().to_string())
}
