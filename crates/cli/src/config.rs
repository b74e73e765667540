use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server host to connect to
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port to connect to
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Load config from the default location (~/.config/kvsh/config.toml)
    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Load config from a specific path, falling back to defaults when the
    /// file is missing or unparsable
    fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|content| toml::from_str(&content).ok())
            .unwrap_or_default()
    }

    /// Get config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("kvsh/config.toml"))
    }
}
