use crate::snapshot::MatchBy;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Complete alertwatch configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Where entities are extracted from
///
/// Selectors are JSON Pointers. `item_selector` is resolved against the
/// document root and must point at an array; the other two are resolved
/// inside each item.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_source_url")]
    pub url: String,
    #[serde(default = "default_item_selector")]
    pub item_selector: String,
    #[serde(default = "default_name_selector")]
    pub name_selector: String,
    #[serde(default = "default_alert_selector")]
    pub alert_selector: String,
    /// Upper bound for one extraction (seconds)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_source_url() -> String {
    "https://example.com/regions.json".to_string()
}

fn default_item_selector() -> String {
    "/regions".to_string()
}

fn default_name_selector() -> String {
    "/name".to_string()
}

fn default_alert_selector() -> String {
    "/alert".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_source_url(),
            item_selector: default_item_selector(),
            name_selector: default_name_selector(),
            alert_selector: default_alert_selector(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Poll loop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PollerConfig {
    /// Period between ticks (seconds)
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
    /// How fresh entities are paired with the current snapshot
    #[serde(default)]
    pub match_by: MatchBy,
}

fn default_interval_seconds() -> u64 {
    10
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval_seconds(),
            match_by: MatchBy::default(),
        }
    }
}

impl PollerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory served for unmatched paths, skipped when absent
    #[serde(default = "default_static_dir")]
    pub static_dir: Option<PathBuf>,
    /// Interval between SSE keep-alive comments (seconds)
    #[serde(default = "default_keep_alive_seconds")]
    pub keep_alive_seconds: u64,
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> Option<PathBuf> {
    Some(PathBuf::from("public"))
}

fn default_keep_alive_seconds() -> u64 {
    15
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            static_dir: default_static_dir(),
            keep_alive_seconds: default_keep_alive_seconds(),
        }
    }
}

impl AppConfig {
    /// Apply `ALERTWATCH_*` environment overrides. Unparsable values are ignored.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("ALERTWATCH_SOURCE_URL") {
            self.source.url = v;
        }
        if let Some(v) = lookup("ALERTWATCH_ITEM_SELECTOR") {
            self.source.item_selector = v;
        }
        if let Some(v) = lookup("ALERTWATCH_NAME_SELECTOR") {
            self.source.name_selector = v;
        }
        if let Some(v) = lookup("ALERTWATCH_ALERT_SELECTOR") {
            self.source.alert_selector = v;
        }
        if let Some(n) = lookup("ALERTWATCH_EXTRACT_TIMEOUT_SECONDS").and_then(|v| v.parse().ok()) {
            self.source.timeout_seconds = n;
        }
        if let Some(n) = lookup("ALERTWATCH_POLL_INTERVAL_SECONDS").and_then(|v| v.parse().ok()) {
            self.poller.interval_seconds = n;
        }
        if let Some(m) = lookup("ALERTWATCH_MATCH_BY").and_then(|v| v.parse().ok()) {
            self.poller.match_by = m;
        }
        if let Some(p) = lookup("ALERTWATCH_PORT").and_then(|v| v.parse().ok()) {
            self.server.port = p;
        }
        if let Some(v) = lookup("ALERTWATCH_STATIC_DIR") {
            self.server.static_dir = if v.is_empty() { None } else { Some(PathBuf::from(v)) };
        }
    }

    /// Reject values that would stall or spin the poll loop or live streams
    pub fn validate(&self) -> Result<()> {
        if self.poller.interval_seconds == 0 {
            anyhow::bail!("poller.interval_seconds must be greater than zero");
        }
        if self.source.timeout_seconds == 0 {
            anyhow::bail!("source.timeout_seconds must be greater than zero");
        }
        if self.server.keep_alive_seconds == 0 {
            anyhow::bail!("server.keep_alive_seconds must be greater than zero");
        }
        Ok(())
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: AppConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config)
}

/// Load the file if it exists (defaults otherwise), then apply env overrides and validate
pub fn resolve_config(path: &Path) -> Result<AppConfig> {
    let mut config = if path.exists() {
        load_config(path)?
    } else {
        AppConfig::default()
    };
    config.apply_env();
    config.validate()?;
    Ok(config)
}
