use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the OpenLaw back end serving `/search`
    pub api_base_url: String,

    /// Seconds to wait for a reply before giving up
    pub request_timeout_secs: u64,

    /// What an open signal does while the widget is already open
    pub reopen_policy: ReopenPolicy,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

/// Behaviour of `openWidget` when a conversation is already open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReopenPolicy {
    /// Close the current conversation and start a fresh one
    #[default]
    Replace,
    /// Keep the conversation and send the starter text as a follow-up
    Append,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            reopen_policy: ReopenPolicy::default(),
            user_agent: format!("openlaw-intake/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Config {
    /// Load `~/.openlaw/config.toml`, then apply environment overrides
    pub fn load() -> Result<Self> {
        Self::load_with_env(&Self::default_path()?)
    }

    /// Load from `path`, then apply environment overrides
    pub fn load_with_env(path: &Path) -> Result<Self> {
        let mut config = Self::load_from(path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load from an explicit path; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Save configuration to file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        Ok(home.join(".openlaw").join("config.toml"))
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("OPENLAW_API_URL") {
            self.api_base_url = url;
        }
        if let Some(secs) = lookup("OPENLAW_TIMEOUT_SECS") {
            self.request_timeout_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("OPENLAW_TIMEOUT_SECS is not a number: {secs}"))?;
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// `/search` endpoint URL
    pub fn search_url(&self) -> String {
        format!("{}/search", self.api_base_url.trim_end_matches('/'))
    }
}
