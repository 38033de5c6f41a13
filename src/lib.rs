//! Salvador - music download, convert & pitch-shift service
//!
//! A local HTTP service that coordinates two external tools: yt-dlp for
//! searching and downloading music videos, and ffmpeg for transcoding and
//! pitch/tempo shifting. Finished assets live in a flat filesystem store
//! and are served back over the same HTTP surface.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `store` - Filesystem asset store (audio + thumbnails)
//! - `tools` - External tool invocation (yt-dlp, ffmpeg)
//! - `thumbnail` - Cover thumbnail fetching
//! - `pipeline` - Media pipeline coordinating the above
//! - `cli` - Command-line interface and the HTTP server
//!
//! # Example
//!
//! ```rust,no_run
//! use salvador::config::Settings;
//! use salvador::pipeline::MediaPipeline;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let pipeline = MediaPipeline::new(&settings)?;
//!
//!     let results = pipeline.search("caparezza vieni a ballare").await?;
//!     println!("Found {} tracks", results.len());
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod store;
pub mod thumbnail;
pub mod tools;

pub use error::{Result, SalvadorError};
