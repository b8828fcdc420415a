//! Installs the process-wide `tracing` subscriber, mirroring the updater's
//! own `tracing_logger` so both processes log identically.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let result = tracing_subscriber::registry().with(filter).with(fmt::layer().with_target(true)).try_init();
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
