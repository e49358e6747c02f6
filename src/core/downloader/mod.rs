pub mod client;
pub mod game;

pub use client::download_file;
pub use game::{DownloadStatus, FileStatus, GameDownloader, StatusFn};
