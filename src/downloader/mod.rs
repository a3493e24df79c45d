// Downloader module - stream selection, transfer and assembly

pub mod backends;
pub mod diagnostics;
pub mod errors;
pub mod format_selector;
pub mod merge;
pub mod models;
pub mod orchestrator;
pub mod progress;
pub mod tools;
pub mod traits;
pub mod utils;

pub use backends::YtDlpResolver;
pub use errors::{DownloadError, ResolverError};
pub use format_selector::{FormatSelector, Selection};
pub use merge::TrackMerger;
pub use models::{
    outcome_message, DownloadOutcome, DownloadProgress, DownloadRequest, MergeStrategy,
    NetworkConfig, Resolution, SourceHandle, StreamDescriptor, StreamKind, VideoMetadata,
};
pub use orchestrator::Downloader;
pub use tools::{ToolManager, ToolStatus, ToolType};
pub use traits::{ProgressReporter, SilentReporter, StreamResolver, TransferHooks};
pub use utils::sanitize_filename;
