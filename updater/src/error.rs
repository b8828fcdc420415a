//! Error taxonomy: every failure the controller sees is classified into one
//! of the kinds from the error-handling design (config/auth, transient
//! RPC/network, permanent RPC, data, internal) so the submit loop can decide
//! "skip and continue" without guessing from a raw driver error string.

use solana_client::client_error::{ClientError, ClientErrorKind};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientKind {
    BlockhashExpired,
    BlockhashNotFound,
    RateLimited,
    ConnectionRefused,
    NotFound,
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermanentKind {
    SimulationFailed,
    AccountSizeMismatch,
    UnauthorizedSigner,
    Other,
}

/// Classified result of a submission attempt (C5's contract).
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("transient: {0:?}")]
    Transient(TransientKind),
    #[error("permanent: {0:?}")]
    Permanent(PermanentKind),
}

impl SubmitError {
    /// Never retried at this layer (§7, §9 "Retries are intentionally
    /// absent"): callers only use this to decide whether to log-and-skip
    /// (transient) or surface-and-continue (permanent).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    pub fn classify(err: &ClientError) -> Self {
        let msg = err.to_string().to_lowercase();
        if msg.contains("blockhash not found") {
            return Self::Transient(TransientKind::BlockhashNotFound);
        }
        if msg.contains("block height exceeded") || msg.contains("blockhash expired") {
            return Self::Transient(TransientKind::BlockhashExpired);
        }
        if msg.contains("429") || msg.contains("too many requests") || msg.contains("rate limit") {
            return Self::Transient(TransientKind::RateLimited);
        }
        if msg.contains("503") || msg.contains("504") {
            return Self::Transient(TransientKind::RateLimited);
        }
        if msg.contains("connection refused") || msg.contains("econnrefused") {
            return Self::Transient(TransientKind::ConnectionRefused);
        }
        if msg.contains("not found") || msg.contains("enotfound") || msg.contains("dns") {
            return Self::Transient(TransientKind::NotFound);
        }
        if msg.contains("timed out") || matches!(err.kind(), ClientErrorKind::Io(_)) {
            return Self::Transient(TransientKind::Timeout);
        }
        if msg.contains("unauthorizedsigner") {
            return Self::Permanent(PermanentKind::UnauthorizedSigner);
        }
        if msg.contains("statesizemismatch") {
            return Self::Permanent(PermanentKind::AccountSizeMismatch);
        }
        Self::Permanent(PermanentKind::Other)
    }
}

/// Fatal startup errors (config/auth kind) — these abort the process before
/// the supervised relay/controller pair is ever spawned.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
    #[error("key material error: {0}")]
    Key(String),
    #[error("lock file held by another live process (pid {0})")]
    LockHeld(i32),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
