pub mod config;
pub mod downloader;
pub mod logging;

mod cli;

pub use cli::run;
