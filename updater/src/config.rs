//! Environment configuration with validation, mirroring the shape of the
//! reader's own `Config` (nested structs, `from_env` + `validate`,
//! `serde` for introspection/logging).

use std::collections::HashMap;
use std::env;

use serde::{Deserialize, Serialize};

/// Where the updater reads its signing key material from. Exactly one of
/// these per process; the bytes are dropped immediately after `KeyHandle`
/// construction (see `crate::key_handle`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum KeySource {
    /// `UPDATER_KEYPAIR_JSON` holds the raw JSON-array secret key.
    Env(String),
    /// Read a single line of JSON-array secret key from stdin at startup.
    Stdin,
    /// Path to a JSON keypair file, same format `solana-keygen` writes.
    File(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolanaConfig {
    pub rpc_url: String,
    pub ws_url: String,
    pub program_id: String,
    pub commitment: String,
}

/// Per-asset validator bounds (§4.4.1). Deliberately not hard-coded: every
/// deployment can tune these via `VALIDATOR_BOUNDS_JSON`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AssetBounds {
    pub min: f64,
    pub max: f64,
    pub max_fractional_change: f64,
    pub min_submit_interval_ms: u64,
}

impl Default for AssetBounds {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: f64::MAX,
            max_fractional_change: 0.20,
            min_submit_interval_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub open_duration_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self { failure_threshold: 10, open_duration_ms: 60_000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub solana: SolanaConfig,
    /// 1-based slot this process signs for.
    pub updater_index: u8,
    pub key_source: KeySource,
    /// Whether this process's key is also the state account's
    /// `update_authority`, permitted to run `initialize` on first start.
    pub is_authority: bool,
    pub decimals: u8,
    pub tick_ms: u64,
    pub publish_ms: u64,
    pub circuit_breaker: CircuitBreakerConfig,
    pub bounds: HashMap<String, AssetBounds>,
    pub lock_file_path: String,
    pub log_level: String,
    /// Base URL of the institutional/primary feed provider, templated with
    /// `/<feed_id>` per asset (§4.3 "Source selection per asset").
    pub institutional_feed_base_url: String,
    pub institutional_poll_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let key_source = match env::var("UPDATER_KEY_SOURCE").as_deref() {
            Ok("stdin") => KeySource::Stdin,
            Ok("file") => KeySource::File(
                env::var("UPDATER_KEYPAIR_PATH")
                    .map_err(|_| ConfigError::MissingRequired("UPDATER_KEYPAIR_PATH".into()))?,
            ),
            _ => KeySource::Env(
                env::var("UPDATER_KEYPAIR_JSON")
                    .map_err(|_| ConfigError::MissingRequired("UPDATER_KEYPAIR_JSON".into()))?,
            ),
        };

        let bounds = match env::var("VALIDATOR_BOUNDS_JSON") {
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| ConfigError::InvalidConfig(format!("VALIDATOR_BOUNDS_JSON: {e}")))?,
            Err(_) => HashMap::new(),
        };

        Ok(Config {
            solana: SolanaConfig {
                rpc_url: env::var("SOLANA_RPC_URL")
                    .unwrap_or_else(|_| "http://localhost:8899".to_string()),
                ws_url: env::var("SOLANA_WS_URL")
                    .unwrap_or_else(|_| "ws://localhost:8900".to_string()),
                program_id: env::var("PROGRAM_ID")
                    .unwrap_or_else(|_| oracle_common::chain::PROGRAM_ID_BASE58.to_string()),
                commitment: env::var("SOLANA_COMMITMENT")
                    .unwrap_or_else(|_| "processed".to_string()),
            },
            updater_index: env::var("UPDATER_INDEX")
                .map_err(|_| ConfigError::MissingRequired("UPDATER_INDEX".into()))?
                .parse()
                .map_err(|_| ConfigError::InvalidConfig("UPDATER_INDEX must be 1..=N".into()))?,
            key_source,
            is_authority: env::var("UPDATER_IS_AUTHORITY")
                .map(|v| v == "true")
                .unwrap_or(false),
            decimals: env::var("ORACLE_DECIMALS")
                .unwrap_or_else(|_| "8".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidConfig("ORACLE_DECIMALS must be a u8".into()))?,
            tick_ms: env::var("TICK_MS")
                .unwrap_or_else(|_| "750".to_string())
                .parse()
                .unwrap_or(750),
            publish_ms: env::var("PUBLISH_MS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap_or(1000),
            circuit_breaker: CircuitBreakerConfig::default(),
            bounds,
            lock_file_path: env::var("LOCK_FILE_PATH")
                .unwrap_or_else(|_| "/tmp/oracle-updater.lock".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            institutional_feed_base_url: env::var("INSTITUTIONAL_FEED_BASE_URL")
                .unwrap_or_else(|_| "https://institutional-feed.internal/v1/prices".to_string()),
            institutional_poll_ms: env::var("INSTITUTIONAL_POLL_MS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap_or(1000),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.solana.program_id.is_empty() {
            return Err(ConfigError::MissingRequired("program_id".to_string()));
        }
        if self.updater_index == 0 || self.updater_index as usize > oracle_common::NUM_SLOTS {
            return Err(ConfigError::InvalidConfig(format!(
                "updater_index must be in 1..={}",
                oracle_common::NUM_SLOTS
            )));
        }
        if self.tick_ms == 0 || self.publish_ms == 0 {
            return Err(ConfigError::InvalidConfig(
                "tick_ms and publish_ms must be > 0".to_string(),
            ));
        }
        if self.circuit_breaker.failure_threshold == 0 {
            return Err(ConfigError::InvalidConfig(
                "circuit_breaker.failure_threshold must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn bounds_for(&self, symbol: &str) -> AssetBounds {
        self.bounds.get(symbol).copied().unwrap_or_default()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    MissingRequired(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            solana: SolanaConfig {
                rpc_url: "http://localhost:8899".into(),
                ws_url: "ws://localhost:8900".into(),
                program_id: "TestProgramId123".into(),
                commitment: "processed".into(),
            },
            updater_index: 1,
            key_source: KeySource::Env("UPDATER_KEYPAIR_JSON".into()),
            is_authority: false,
            decimals: 8,
            tick_ms: 750,
            publish_ms: 1000,
            circuit_breaker: CircuitBreakerConfig::default(),
            bounds: HashMap::new(),
            lock_file_path: "/tmp/test.lock".into(),
            log_level: "info".into(),
            institutional_feed_base_url: "https://institutional-feed.internal/v1/prices".into(),
            institutional_poll_ms: 1000,
        }
    }

    #[test]
    fn validate_accepts_sample() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_index() {
        let mut cfg = sample();
        cfg.updater_index = 0;
        assert!(cfg.validate().is_err());
        cfg.updater_index = (oracle_common::NUM_SLOTS as u8) + 1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn bounds_for_falls_back_to_default() {
        let cfg = sample();
        let b = cfg.bounds_for("BTC");
        assert_eq!(b.max_fractional_change, 0.20);
    }
}
