//! Runtime configuration
//!
//! Layered: built-in defaults, then an optional TOML file, then environment
//! overrides. Unparseable environment values are ignored.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::scrapers::rate_limit::RateLimitConfig;

pub const DEFAULT_API_BASE: &str = "https://www.speedrun.com/api/v1";
pub const DEFAULT_TOP: usize = 10;
/// Largest page the runs endpoint serves
pub const MAX_PAGE_SIZE: u32 = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Versioned REST base, without trailing slash
    pub api_base: String,
    pub user_agent: String,
    /// Transport timeout for a single request
    pub timeout_secs: u64,
    /// Keep only the N best cells per date; 0 keeps everyone
    pub top: usize,
    /// Runs per page (`max`); unset leaves the API default
    pub page_size: Option<u32>,
    pub rate_limit: RateLimitConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            user_agent: concat!("leaderboard-timeline/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 30,
            top: DEFAULT_TOP,
            page_size: None,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl Config {
    /// Defaults, overlaid with `path` (if any) and then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_toml_file(p)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Apply `SRC_*` / `TIMELINE_*` overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SRC_API_BASE").filter(|v| !v.trim().is_empty()) {
            self.api_base = v.trim().trim_end_matches('/').to_string();
        }
        if let Some(v) = lookup("SRC_USER_AGENT").filter(|v| !v.trim().is_empty()) {
            self.user_agent = v;
        }
        if let Some(secs) = lookup("SRC_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.timeout_secs = secs;
        }
        if let Some(n) = lookup("SRC_RATE_MAX_REQUESTS").and_then(|v| v.parse().ok()) {
            self.rate_limit.max_requests = n;
        }
        if let Some(secs) = lookup("SRC_RATE_WINDOW_SECS").and_then(|v| v.parse().ok()) {
            self.rate_limit.window_secs = secs;
        }
        if let Some(ms) = lookup("SRC_RATE_MIN_SPACING_MS").and_then(|v| v.parse().ok()) {
            self.rate_limit.min_spacing_ms = ms;
        }
        if let Some(n) = lookup("SRC_PAGE_SIZE").and_then(|v| v.parse().ok()) {
            self.page_size = Some(n);
        }
        if let Some(top) = lookup("TIMELINE_TOP").and_then(|v| v.parse().ok()) {
            self.top = top;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.rate_limit.max_requests == 0 {
            bail!("rate_limit.max_requests must be at least 1");
        }
        if let Some(n) = self.page_size {
            if n == 0 || n > MAX_PAGE_SIZE {
                bail!("page_size must be between 1 and {}, got {}", MAX_PAGE_SIZE, n);
            }
        }
        if !self.api_base.starts_with("http://") && !self.api_base.starts_with("https://") {
            bail!("api_base must be an http(s) URL, got '{}'", self.api_base);
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `None` when truncation is disabled.
    pub fn top_n(&self) -> Option<usize> {
        (self.top > 0).then_some(self.top)
    }
}
