// Stream resolver implementations

pub mod ytdlp;

pub use ytdlp::YtDlpResolver;
