use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub search: SearchConfig,
    #[serde(default)]
    pub window: WindowConfig,
    pub fetch: FetchConfig,
    #[serde(default)]
    pub email: Option<EmailConfig>,
    #[serde(default)]
    pub refresh: RefreshConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    pub origins: Vec<String>,
    pub destination: String,
    #[serde(default = "default_horizon_weeks")]
    pub horizon_weeks: u32,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_horizon_weeks() -> u32 {
    3
}
fn default_top_n() -> usize {
    3
}
fn default_currency() -> String {
    "EUR".to_string()
}

/// Which leg timestamp must fall inside the configured window.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimeMatchMode {
    #[default]
    DepartOnly,
    ArriveOnly,
    Either,
}

/// Local-time windows applied per leg. Bounds are inclusive `HH:MM` strings;
/// zero-padded 24h strings make lexicographic comparison sufficient.
#[derive(Debug, Deserialize, Clone)]
pub struct WindowConfig {
    #[serde(default = "default_window_from")]
    pub outbound_from: String,
    #[serde(default = "default_window_to")]
    pub outbound_to: String,
    #[serde(default = "default_window_from")]
    pub inbound_from: String,
    #[serde(default = "default_window_to")]
    pub inbound_to: String,
    #[serde(default)]
    pub outbound_match: TimeMatchMode,
    #[serde(default)]
    pub inbound_match: TimeMatchMode,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            outbound_from: default_window_from(),
            outbound_to: default_window_to(),
            inbound_from: default_window_from(),
            inbound_to: default_window_to(),
            outbound_match: TimeMatchMode::default(),
            inbound_match: TimeMatchMode::default(),
        }
    }
}

fn default_window_from() -> String {
    "16:00".to_string()
}
fn default_window_to() -> String {
    "23:59".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    pub base_url: String,
    pub host: String,
    /// Name of the environment variable holding the API key. The key itself
    /// never lives in the config file.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_limit_per_query")]
    pub limit_per_query: u32,
    #[serde(default)]
    pub stops: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_key_env() -> String {
    "RAPIDAPI_KEY".to_string()
}
fn default_provider() -> String {
    "rapidapi".to_string()
}
fn default_limit_per_query() -> u32 {
    250
}
fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub smtp_user: String,
    /// Name of the environment variable holding the SMTP password.
    #[serde(default = "default_smtp_pass_env")]
    pub smtp_pass_env: String,
    pub to: String,
    #[serde(default = "default_subject")]
    pub subject: String,
}

fn default_smtp_port() -> u16 {
    587
}
fn default_smtp_pass_env() -> String {
    "SMTP_PASS".to_string()
}
fn default_subject() -> String {
    "Weekend flights monitor".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct RefreshConfig {
    /// Minimum days between full runs; `run --force` bypasses this.
    #[serde(default = "default_every_days")]
    pub every_days: u32,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            every_days: default_every_days(),
        }
    }
}

fn default_every_days() -> u32 {
    1
}

/// Checks that a window bound is a zero-padded 24h `HH:MM` string.
fn valid_hhmm(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return false;
    }
    let (h, m) = (&s[..2], &s[3..]);
    matches!(h.parse::<u8>(), Ok(h) if h < 24) && matches!(m.parse::<u8>(), Ok(m) if m < 60)
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate search scope
    if config.search.origins.is_empty() {
        anyhow::bail!("search.origins must name at least one origin");
    }
    if config.search.destination.trim().is_empty() {
        anyhow::bail!("search.destination must not be empty");
    }
    if config.search.horizon_weeks == 0 {
        anyhow::bail!("search.horizon_weeks must be >= 1");
    }
    if config.search.top_n == 0 {
        anyhow::bail!("search.top_n must be >= 1");
    }

    // Validate windows
    for (name, bound) in [
        ("window.outbound_from", &config.window.outbound_from),
        ("window.outbound_to", &config.window.outbound_to),
        ("window.inbound_from", &config.window.inbound_from),
        ("window.inbound_to", &config.window.inbound_to),
    ] {
        if !valid_hhmm(bound) {
            anyhow::bail!("{} must be a zero-padded HH:MM string, got '{}'", name, bound);
        }
    }
    if config.window.outbound_from > config.window.outbound_to {
        anyhow::bail!("window.outbound_from must be <= window.outbound_to");
    }
    if config.window.inbound_from > config.window.inbound_to {
        anyhow::bail!("window.inbound_from must be <= window.inbound_to");
    }

    // Validate fetch
    if config.fetch.base_url.trim().is_empty() {
        anyhow::bail!("fetch.base_url must not be empty");
    }
    if config.fetch.limit_per_query == 0 {
        anyhow::bail!("fetch.limit_per_query must be >= 1");
    }

    Ok(config)
}
