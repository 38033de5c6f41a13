//! Configuration settings for Salvador.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub tools: ToolSettings,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Base URL used when building returned asset URLs. Empty means
    /// `http://{host}:{port}`.
    pub public_url: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            public_url: String::new(),
        }
    }
}

impl ServerSettings {
    /// Base URL clients can use to reach this service.
    pub fn base_url(&self) -> String {
        if self.public_url.is_empty() {
            format!("http://{}:{}", self.host, self.port)
        } else {
            self.public_url.trim_end_matches('/').to_string()
        }
    }
}

/// Asset store directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Directory for downloaded and converted audio.
    pub audio_dir: String,
    /// Directory for cover thumbnails.
    pub thumbnail_dir: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            audio_dir: "assets/musiche".to_string(),
            thumbnail_dir: "assets/copertine".to_string(),
        }
    }
}

/// External tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// yt-dlp binary name or path.
    pub ytdlp_bin: String,
    /// ffmpeg binary name or path.
    pub ffmpeg_bin: String,
    /// Number of results a search asks for.
    pub search_limit: usize,
    /// Hard cap on any single tool invocation, in seconds.
    pub tool_timeout_seconds: u64,
    /// How many external processes may run at once.
    pub max_concurrent_tools: usize,
    /// Sample rate the pitch filter resamples around.
    pub base_sample_rate: u32,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ytdlp_bin: "yt-dlp".to_string(),
            ffmpeg_bin: "ffmpeg".to_string(),
            search_limit: 10,
            tool_timeout_seconds: 300,
            max_concurrent_tools: 4,
            base_sample_rate: 44100,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::SalvadorError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("salvador")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded audio directory path.
    pub fn audio_dir(&self) -> PathBuf {
        Self::expand_path(&self.storage.audio_dir)
    }

    /// Get the expanded thumbnail directory path.
    pub fn thumbnail_dir(&self) -> PathBuf {
        Self::expand_path(&self.storage.thumbnail_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_original_layout() {
        let settings = Settings::default();
        assert_eq!(settings.storage.audio_dir, "assets/musiche");
        assert_eq!(settings.storage.thumbnail_dir, "assets/copertine");
        assert_eq!(settings.tools.search_limit, 10);
    }

    #[test]
    fn test_base_url() {
        let mut server = ServerSettings::default();
        assert_eq!(server.base_url(), "http://127.0.0.1:8080");

        server.public_url = "https://music.local/".to_string();
        assert_eq!(server.base_url(), "https://music.local");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.server.port = 9999;
        settings.tools.search_limit = 3;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.server.port, 9999);
        assert_eq!(loaded.tools.search_limit, 3);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let path = PathBuf::from("/nonexistent/salvador/config.toml");
        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.server.port, 8080);
    }
}
