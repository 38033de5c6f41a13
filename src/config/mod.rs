//! Configuration module for Salvador.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{ServerSettings, Settings, StorageSettings, ToolSettings};
