//! Environment configuration, mirroring the updater's `Config` shape
//! (`from_env` + `validate`, `serde` for introspection/logging).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub rpc_url: String,
    pub program_id: String,
    pub server_host: String,
    pub server_port: u16,
    /// Cadence for both the `/api/state` polling loop and the `/api/stream`
    /// push cadence (spec.md §4.7 `POLL_MS`, default 250 ms).
    pub poll_ms: u64,
    /// This deployment's expected `decimals`, compared against the
    /// on-chain value on every fetch (spec.md §9 "decimals mismatch"):
    /// a mismatch is a configuration error unless `decimals_override` is
    /// also set, in which case the override wins explicitly.
    pub expected_decimals: u8,
    /// Explicit override for the on-chain `decimals` field, acknowledging
    /// a known mismatch instead of erroring (spec.md §9).
    pub decimals_override: Option<u8>,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            rpc_url: std::env::var("SOLANA_RPC_URL")
                .unwrap_or_else(|_| "http://localhost:8899".to_string()),
            program_id: std::env::var("PROGRAM_ID")
                .unwrap_or_else(|_| oracle_common::chain::PROGRAM_ID_BASE58.to_string()),
            server_host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8090),
            poll_ms: std::env::var("POLL_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(250),
            expected_decimals: std::env::var("EXPECTED_DECIMALS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8),
            decimals_override: std::env::var("DASHBOARD_DECIMALS_OVERRIDE")
                .ok()
                .and_then(|p| p.parse().ok()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.program_id.is_empty() {
            return Err(ConfigError::InvalidConfig("program_id must not be empty".to_string()));
        }
        if self.poll_ms == 0 {
            return Err(ConfigError::InvalidConfig("poll_ms must be > 0".to_string()));
        }
        if let Some(d) = self.decimals_override {
            if d > 18 {
                return Err(ConfigError::InvalidConfig(
                    "DASHBOARD_DECIMALS_OVERRIDE is implausibly large".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
