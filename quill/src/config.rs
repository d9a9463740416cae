//! User configuration for quill.
//!
//! Read once at startup from `$XDG_CONFIG_HOME/quill/config.toml`, falling back
//! to `~/.config/quill/config.toml`. Every key is optional. A missing file
//! yields the defaults; an unreadable or malformed one logs a warning and also
//! yields the defaults, so a bad config never prevents startup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use quill_core::generation::{StudentLevel, Tone};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Built-in theme name, `dark` or `catppuccin-mocha`.
    pub theme: String,
    pub writer: WriterConfig,
    pub stream: StreamConfig,
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: "catppuccin-mocha".to_owned(),
            writer: WriterConfig::default(),
            stream: StreamConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// Persona and tone the copilot starts with.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    pub persona: StudentLevel,
    pub tone: Tone,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Pause between generated chunks, imitating a token stream.
    pub chunk_delay_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self { chunk_delay_ms: 50 }
    }
}

impl StreamConfig {
    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: "info".to_owned() }
    }
}

impl Config {
    /// Loads the config file, falling back to defaults on any error.
    ///
    /// Returns the warning to log once logging is up, since the log level
    /// itself comes from this file.
    pub fn load() -> (Self, Option<ConfigError>) {
        let path = config_path();
        if !path.exists() {
            return (Self::default(), None);
        }
        match Self::from_path(&path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }
}

/// Returns the path to the quill config file.
pub fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("quill").join("config.toml")
}
