//! Installs the process-wide `tracing` subscriber.
//!
//! Mirrors the reader's own `tracing_logger` in shape (env-filter driven,
//! installed once at startup) but without the request-correlation-id
//! machinery that backend has no equivalent need for here: the updater has
//! no inbound requests, only its own tasks, so the structured fields worth
//! attaching are `asset`, `venue`, and `updater_index`/`consecutive_failures`
//! rather than a per-request correlation id.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs a `fmt` subscriber filtered by `RUST_LOG` (falling back to
/// `default_level` when unset). Safe to call once per process; a second
/// call is a logged no-op rather than a panic, since restart-supervised
/// tests may end up importing this more than once.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();

    if let Err(e) = result {
        eprintln!("tracing subscriber already initialized: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_does_not_panic_on_repeat_calls() {
        init("info");
        init("debug");
    }
}
