//! User configuration file.
//!
//! An optional TOML file supplying defaults for playback. Command-line
//! flags always win over file values. A missing file yields the built-in
//! defaults; a malformed file is an error (silently ignoring it would
//! mask typos).

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::channel::DEFAULT_CAPACITY;
use crate::player::glyph::DEFAULT_RAMP;

/// Defaults read from `~/.config/asciiplay/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Glyph ramp used when `--grayscale` is not given.
    pub grayscale: String,
    /// Reverse the ramp end-to-end.
    pub reverse: bool,
    /// Capacity of the live frame channel.
    pub channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grayscale: DEFAULT_RAMP.to_string(),
            reverse: false,
            channel_capacity: DEFAULT_CAPACITY,
        }
    }
}

impl Config {
    /// Platform config file location, if a config directory exists.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("asciiplay").join("config.toml"))
    }

    /// Loads the config file, falling back to defaults when absent.
    pub fn load() -> Result<Self> {
        let Some(path) = Self::config_path() else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_match_builtin_constants() {
        let config = Config::default();
        assert_eq!(config.grayscale, DEFAULT_RAMP);
        assert!(!config.reverse);
        assert_eq!(config.channel_capacity, DEFAULT_CAPACITY);
    }

    #[test]
    fn partial_file_fills_missing_fields_with_defaults() {
        let config: Config = toml::from_str("reverse = true").unwrap();
        assert!(config.reverse);
        assert_eq!(config.grayscale, DEFAULT_RAMP);
        assert_eq!(config.channel_capacity, DEFAULT_CAPACITY);
    }

    #[test]
    fn serializes_back_to_parseable_toml() {
        let config = Config {
            grayscale: " .@".to_string(),
            reverse: true,
            channel_capacity: 4,
        };
        let text = toml::to_string(&config).unwrap();
        let reparsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(reparsed, config);
    }
}
