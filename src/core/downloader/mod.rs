mod client;

pub use client::{sha1_hex, DownloadEntry, Downloader};
