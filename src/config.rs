// src/config.rs
//! Scoring service configuration, loaded from the environment with
//! builder-style overrides.

use std::time::Duration;
use tracing::warn;

const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:5555";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_REFETCH_DELAY_SECS: u64 = 5;
const DEFAULT_REFETCH_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct MatchServiceConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
    pub refetch_delay_seconds: u64,
    pub refetch_timeout_seconds: u64,
}

impl MatchServiceConfig {
    /// Load from environment variables, falling back to defaults:
    /// `MATCH_SERVICE_URL`, `MATCH_SERVICE_API_KEY`, `MATCH_TIMEOUT_SECONDS`,
    /// `MATCH_REFETCH_DELAY_SECONDS`, `MATCH_REFETCH_TIMEOUT_SECONDS`.
    pub fn from_env() -> Self {
        let base_url = std::env::var("MATCH_SERVICE_URL")
            .unwrap_or_else(|_| DEFAULT_SERVICE_URL.to_string());
        let api_key = std::env::var("MATCH_SERVICE_API_KEY").ok();

        Self {
            base_url,
            api_key,
            timeout_seconds: env_seconds("MATCH_TIMEOUT_SECONDS", DEFAULT_TIMEOUT_SECS),
            refetch_delay_seconds: env_seconds(
                "MATCH_REFETCH_DELAY_SECONDS",
                DEFAULT_REFETCH_DELAY_SECS,
            ),
            refetch_timeout_seconds: env_seconds(
                "MATCH_REFETCH_TIMEOUT_SECONDS",
                DEFAULT_REFETCH_TIMEOUT_SECS,
            ),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn refetch_delay(&self) -> Duration {
        Duration::from_secs(self.refetch_delay_seconds)
    }

    pub fn refetch_timeout(&self) -> Duration {
        Duration::from_secs(self.refetch_timeout_seconds)
    }
}

impl Default for MatchServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVICE_URL.to_string(),
            api_key: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            refetch_delay_seconds: DEFAULT_REFETCH_DELAY_SECS,
            refetch_timeout_seconds: DEFAULT_REFETCH_TIMEOUT_SECS,
        }
    }
}

fn env_seconds(name: &str, default: u64) -> u64 {
    match std::env::var(name) {
        Ok(raw) => match raw.parse() {
            Ok(seconds) => seconds,
            Err(_) => {
                warn!("Ignoring unparseable {}={:?}, using {}s", name, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}
