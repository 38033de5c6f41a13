//! CLI module for Salvador.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Salvador - music download, convert & pitch-shift service
///
/// A local HTTP service that searches music videos, downloads their audio
/// as MP3, saves cover thumbnails, and applies pitch/tempo shifts.
#[derive(Parser, Debug)]
#[command(name = "salvador")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Salvador and verify system requirements
    Init,

    /// Check system requirements and configuration
    Doctor,

    /// Start the HTTP service
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
}
