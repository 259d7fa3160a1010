//! ytdlp-relay - HTTP relay for yt-dlp
//!
//! Serves `/info` (metadata projection of `yt-dlp --dump-json`) and
//! `/download` (yt-dlp stdout streamed straight into the response body).

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod metadata;
pub mod models;
pub mod relay;
pub mod server;
