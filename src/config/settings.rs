// Configuration structs

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::store::HotspotThresholds;

const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
// Voice responses are three sentences at most; no need for a large budget
const DEFAULT_MAX_TOKENS: u32 = 300;
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";

/// Rate limiting for the public webhook
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub requests_per_second: f64,
    pub burst: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 5.0,
            burst: 20.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// LLM API key. Absence at startup is fatal, never per-request.
    pub api_key: String,

    /// Model used for intent routing
    pub model: String,

    /// Token budget per routing call
    pub max_tokens: u32,

    /// Timeout on the model call; expiry is a transport failure
    pub request_timeout_secs: u64,

    /// SQLite database location
    pub db_path: PathBuf,

    /// HTTP bind address (e.g. "127.0.0.1:8080")
    pub bind_address: String,

    pub rate_limit: RateLimitConfig,

    /// Open-complaint thresholds for flagging area hotspots
    pub hotspots: HotspotThresholds,

    /// Static reference material passed to the router as context
    pub knowledge_note: String,
}

impl Config {
    /// Defaults for everything except the key
    pub fn with_api_key(api_key: String) -> Self {
        let db_path = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".vaani")
            .join("grievances.db");

        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            db_path,
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            rate_limit: RateLimitConfig::default(),
            hotspots: HotspotThresholds::default(),
            knowledge_note: String::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            bail!("API key must not be empty");
        }
        if self.model.trim().is_empty() {
            bail!("Model name must not be empty");
        }
        if self.max_tokens == 0 {
            bail!("max_tokens must be positive");
        }
        if self.bind_address.parse::<std::net::SocketAddr>().is_err() {
            bail!("Invalid bind address: {}", self.bind_address);
        }
        let t = &self.hotspots;
        if !(t.low <= t.medium && t.medium <= t.high && t.high <= t.critical) {
            bail!("Hotspot thresholds must be non-decreasing: low <= medium <= high <= critical");
        }
        Ok(())
    }
}
