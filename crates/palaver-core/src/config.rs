//! Configuration management for Palaver.
//!
//! Loads configuration from ${`PALAVER_HOME`}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable that overrides the chat service base URL.
pub const API_URL_ENV: &str = "PALAVER_API_URL";

/// Base URL used when neither flag, env nor config provide one.
pub const DEFAULT_API_URL: &str = "http://localhost:3001/api/chat";

/// Returns the default config template with comments.
///
/// This is embedded from `default_config.toml` at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path helpers for Palaver directories.
    //!
    //! Resolution order for the home directory:
    //! 1. `PALAVER_HOME` env var
    //! 2. ~/.config/palaver (default)

    use std::path::PathBuf;

    /// Returns the Palaver home directory.
    pub fn palaver_home() -> PathBuf {
        if let Ok(home) = std::env::var("PALAVER_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".palaver"),
            |h| h.join(".config").join("palaver"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        palaver_home().join("config.toml")
    }

    /// Returns the directory that holds log files.
    pub fn logs_dir() -> PathBuf {
        palaver_home().join("logs")
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the chat service.
    pub api_url: Option<String>,

    /// Request timeout for chat service calls in seconds (0 disables).
    pub request_timeout_secs: u32,

    /// Grace period for the exit cleanup request, in milliseconds.
    pub cleanup_grace_ms: u64,

    /// Header title shown above the transcript.
    pub title: String,

    /// Greeting shown at the top of the transcript.
    pub greeting: String,

    /// Placeholder shown in the empty input box.
    pub placeholder: String,

    /// Log filter directive (overridden by `PALAVER_LOG`).
    pub log_level: Option<String>,
}

impl Config {
    const DEFAULT_CLEANUP_GRACE_MS: u64 = 1500;
    const DEFAULT_TITLE: &str = "Industrial Startup Chatbot";
    const DEFAULT_GREETING: &str = "To be tested by E-cell's finest is an honour!";
    const DEFAULT_PLACEHOLDER: &str = "Ask about industrial startups...";

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Resolves the chat service base URL.
    ///
    /// Precedence: `cli_override` > `PALAVER_API_URL` > config file > default.
    ///
    /// # Errors
    /// Returns an error if the winning candidate is not a valid URL.
    pub fn resolve_api_url(&self, cli_override: Option<&str>) -> Result<String> {
        let env_url = std::env::var(API_URL_ENV).ok();
        resolve_base_url(
            &[cli_override, env_url.as_deref(), self.api_url.as_deref()],
            DEFAULT_API_URL,
        )
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        if self.request_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(u64::from(self.request_timeout_secs)))
        }
    }

    pub fn cleanup_grace(&self) -> Duration {
        Duration::from_millis(self.cleanup_grace_ms)
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    ///
    /// # Errors
    /// Returns an error if the file exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            request_timeout_secs: 0,
            cleanup_grace_ms: Self::DEFAULT_CLEANUP_GRACE_MS,
            title: Self::DEFAULT_TITLE.to_string(),
            greeting: Self::DEFAULT_GREETING.to_string(),
            placeholder: Self::DEFAULT_PLACEHOLDER.to_string(),
            log_level: None,
        }
    }
}

/// Picks the first non-blank candidate, falling back to `default_url`.
///
/// Candidates are trimmed; blank values count as unset.
///
/// # Errors
/// Returns an error if the chosen candidate does not parse as a URL.
pub fn resolve_base_url(candidates: &[Option<&str>], default_url: &str) -> Result<String> {
    for candidate in candidates.iter().flatten() {
        let trimmed = candidate.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed)?;
            return Ok(trimmed.to_string());
        }
    }

    Ok(default_url.to_string())
}

/// Validates that a URL is well-formed.
fn validate_url(url: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid chat service URL: {url}"))?;
    Ok(())
}
