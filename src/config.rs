use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::pipeline::validator::{ValidationLimits, MAX_AMOUNT, MAX_BATCH_ITEMS};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub kv: KvConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Literal key, or `env:NAME` to read it from the environment.
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Cheaper model for slang normalization. Unset means the deterministic
    /// expander runs alone.
    #[serde(default)]
    pub nlu_model: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct StateConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> String {
    "dompet.db".to_string()
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum KvBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct KvConfig {
    #[serde(default)]
    pub backend: KvBackend,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Offset from UTC used to decide what "today" is for the user.
    #[serde(default = "default_timezone_offset_hours")]
    pub timezone_offset_hours: i32,
    #[serde(default = "default_confirmation_ttl_secs")]
    pub confirmation_ttl_secs: u64,
    #[serde(default = "default_dedup_ttl_secs")]
    pub dedup_ttl_secs: u64,
    /// Prior messages (user and assistant) passed to inference.
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,
    #[serde(default = "default_history_ttl_secs")]
    pub history_ttl_secs: u64,
    #[serde(default = "default_max_batch_items")]
    pub max_batch_items: usize,
    #[serde(default = "default_max_amount")]
    pub max_amount: i64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            timezone_offset_hours: default_timezone_offset_hours(),
            confirmation_ttl_secs: default_confirmation_ttl_secs(),
            dedup_ttl_secs: default_dedup_ttl_secs(),
            history_turns: default_history_turns(),
            history_ttl_secs: default_history_ttl_secs(),
            max_batch_items: default_max_batch_items(),
            max_amount: default_max_amount(),
        }
    }
}

impl PipelineConfig {
    pub fn confirmation_ttl(&self) -> Duration {
        Duration::from_secs(self.confirmation_ttl_secs)
    }

    pub fn dedup_ttl(&self) -> Duration {
        Duration::from_secs(self.dedup_ttl_secs)
    }

    pub fn history_ttl(&self) -> Duration {
        Duration::from_secs(self.history_ttl_secs)
    }

    pub fn limits(&self) -> ValidationLimits {
        ValidationLimits {
            max_amount: self.max_amount,
            max_batch_items: self.max_batch_items,
        }
    }
}

fn default_timezone_offset_hours() -> i32 {
    7
}
fn default_confirmation_ttl_secs() -> u64 {
    60
}
fn default_dedup_ttl_secs() -> u64 {
    600
}
fn default_history_turns() -> usize {
    6
}
fn default_history_ttl_secs() -> u64 {
    1800
}
fn default_max_batch_items() -> usize {
    MAX_BATCH_ITEMS
}
fn default_max_amount() -> i64 {
    MAX_AMOUNT
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    /// Messages allowed per user per window. 0 disables the limit.
    #[serde(default = "default_max_messages")]
    pub max_messages: u32,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
            window_secs: default_window_secs(),
        }
    }
}

fn default_max_messages() -> u32 {
    20
}

fn default_window_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// IP address to bind to (default: "127.0.0.1").
    /// Set to "0.0.0.0" to listen on all interfaces.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Shared secret expected in `X-Webhook-Secret`. Unset disables the check.
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            webhook_secret: None,
        }
    }
}

fn default_bind_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Resolve `env:NAME` references; anything else is returned as written.
pub fn resolve_secret(raw: &str) -> anyhow::Result<String> {
    match raw.strip_prefix("env:") {
        Some(name) => std::env::var(name.trim())
            .map_err(|_| anyhow::anyhow!("Environment variable {} is not set", name.trim())),
        None => Ok(raw.to_string()),
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let mut config: AppConfig = toml::from_str(content)?;
        config.provider.api_key = resolve_secret(&config.provider.api_key)?;
        if let Some(secret) = config.server.webhook_secret.take() {
            let secret = resolve_secret(&secret)?;
            config.server.webhook_secret = Some(secret).filter(|s| !s.is_empty());
        }
        if config.provider.nlu_model.as_deref().is_some_and(|m| m.trim().is_empty()) {
            config.provider.nlu_model = None;
        }
        Ok(config)
    }
}
