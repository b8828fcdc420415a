//! Price relay (C3): merges each asset's institutional feed (if any) with
//! its composite feed into a single snapshot, and forwards snapshots plus
//! heartbeats to the controller over an ordered, lossless channel.
//!
//! Acyclic at the data-flow level (§9): one channel out to the controller,
//! one shutdown signal in. No shared mutable state with the controller.

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::interval;
use tracing::info;

use crate::aggregator::VenueTable;
use crate::source_clients::{now_ms, PriceReading, SourceClient};

#[derive(Debug, Clone, PartialEq)]
pub enum RelayMessage {
    Heartbeat { monotonic_ms: u64 },
    PriceUpdate { monotonic_ms: u64, assets: BTreeMap<String, Option<f64>> },
}

/// One asset's wiring: an optional institutional feed plus the set of
/// composite-venue clients that feed `VenueTable`.
pub struct AssetFeed {
    pub symbol: &'static str,
    pub primary: Option<watch::Receiver<Option<PriceReading>>>,
    pub venues: Vec<watch::Receiver<Option<PriceReading>>>,
    pub stale_ms: u64,
    pub tolerance: f64,
}

impl AssetFeed {
    pub fn spawn(symbol: &'static str, primary: Option<SourceClient>, venues: Vec<SourceClient>, stale_ms: u64, tolerance: f64) -> Self {
        Self {
            symbol,
            primary: primary.map(|c| c.spawn()),
            venues: venues.into_iter().map(|c| c.spawn()).collect(),
            stale_ms,
            tolerance,
        }
    }

    /// §4.3 "Source selection per asset": prefer the institutional reading
    /// when present and fresh, otherwise fall back to the composite.
    fn snapshot(&self, now: u64) -> Option<f64> {
        if let Some(primary) = &self.primary {
            if let Some(reading) = *primary.borrow() {
                if now.saturating_sub(reading.observed_ms) <= self.stale_ms {
                    return Some(reading.price);
                }
            }
        }

        let mut table = VenueTable::default();
        for rx in &self.venues {
            if let Some(reading) = *rx.borrow() {
                table.update(reading.venue, reading.price, reading.observed_ms);
            }
        }
        table.composite(now, self.stale_ms, self.tolerance).price
    }
}

pub struct Relay {
    feeds: Vec<AssetFeed>,
    last_emitted: BTreeMap<String, Option<f64>>,
}

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

impl Relay {
    pub fn new(feeds: Vec<AssetFeed>) -> Self {
        Self { feeds, last_emitted: BTreeMap::new() }
    }

    /// Runs until `shutdown` is signalled. Honors shutdown within the 2 s
    /// grace period (§5) since the select loop checks it every tick.
    pub async fn run(mut self, tx: mpsc::Sender<RelayMessage>, publish_ms: u64, mut shutdown: watch::Receiver<bool>) {
        let mut heartbeat = interval(HEARTBEAT_INTERVAL);
        let mut composite_tick = interval(Duration::from_millis(publish_ms));

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    if tx.send(RelayMessage::Heartbeat { monotonic_ms: now_ms() }).await.is_err() {
                        return;
                    }
                }
                _ = composite_tick.tick() => {
                    if let Some(update) = self.tick(now_ms()) {
                        if tx.send(update).await.is_err() {
                            return;
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("relay: shutdown received");
                        return;
                    }
                }
            }
        }
    }

    /// Returns `Some(PriceUpdate)` only if at least one asset's snapshot
    /// changed since the last emission (coarse change detection; the
    /// controller's fixed-point quantized comparison is authoritative).
    fn tick(&mut self, now: u64) -> Option<RelayMessage> {
        let mut assets = BTreeMap::new();
        let mut changed = false;

        for feed in &self.feeds {
            let price = feed.snapshot(now);
            let previous = self.last_emitted.get(feed.symbol).copied().flatten();
            if price != previous {
                changed = true;
            }
            assets.insert(feed.symbol.to_string(), price);
            self.last_emitted.insert(feed.symbol.to_string(), price);
        }

        if changed {
            Some(RelayMessage::PriceUpdate { monotonic_ms: now, assets })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_suppresses_unchanged_snapshots() {
        let mut relay = Relay::new(Vec::new());
        assert_eq!(relay.tick(1_000), None);
    }
}
