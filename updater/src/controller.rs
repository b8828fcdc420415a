//! Controller / supervisor (C4): owns the signing key, merges relay
//! snapshots into `latest`, and runs the submit loop (§4.4).
//!
//! The fresh-set/quantization logic is a pure function (`compute_batch`)
//! over `latest` plus the per-asset submission history, kept free of any
//! RPC or channel machinery so the no-op-suppression and validator-gating
//! rules (§8 laws) are exhaustively unit-testable without async.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use oracle_common::assets::{ASSETS, NUM_ASSETS};
use oracle_common::fixed_point::quantize;
use solana_sdk::signature::Keypair;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::circuit_breaker::{Admission, CircuitBreaker};
use crate::config::{AssetBounds, CircuitBreakerConfig};
use crate::error::SubmitError;
use crate::relay::RelayMessage;
use crate::tx_builder::TransactionBuilder;
use crate::validator::{self, ValidationInput};

/// The controller's merged view of one asset's latest price, per §3
/// `PriceSnapshot` (trimmed to the fields the submit loop consumes —
/// `source_kind`/`active_sources` are relay-internal bookkeeping already
/// folded into the float the relay forwards).
#[derive(Debug, Clone, Copy)]
pub struct PriceSnapshot {
    pub price: f64,
    pub published_ms: u64,
}

#[derive(Default, Clone, Copy)]
struct AssetHistory {
    last_submitted_q: Option<i64>,
    last_submitted_ts_ms: Option<u64>,
}

/// Result of one submit-loop tick's pure fresh-set/validation pass.
pub struct PreparedBatch {
    /// Full per-asset quantized price array in compile-time asset order,
    /// ready to hand to `TransactionBuilder::submit_batch`.
    pub prices: [i64; NUM_ASSETS],
    /// Assets that were fresh, passed validation, and so advance their
    /// submission history on success.
    pub carried_fresh: Vec<(&'static str, i64, u64)>,
}

/// Pure core of the submit loop's steps 1-4 (§4.4). No I/O: reads only the
/// in-memory snapshot map, the per-asset bounds, and the submission
/// history carried in `self`.
pub struct SubmitState {
    history: BTreeMap<&'static str, AssetHistory>,
    decimals: u8,
}

impl SubmitState {
    pub fn new(decimals: u8) -> Self {
        Self { history: BTreeMap::new(), decimals }
    }

    pub fn last_submitted_price(&self, symbol: &str) -> Option<f64> {
        self.history
            .get(symbol)
            .and_then(|h| h.last_submitted_q)
            .map(|q| oracle_common::fixed_point::dequantize(q, self.decimals))
    }

    /// Computes the batch to submit this tick, or `None` if the fresh set
    /// is empty after validation (steps 1, 2, 4 of §4.4). Validation
    /// failures drop only the offending asset from the fresh set; they are
    /// not fatal to the tick.
    pub fn compute_batch(
        &self,
        latest: &BTreeMap<&'static str, PriceSnapshot>,
        now_ms: u64,
        bounds: impl Fn(&str) -> AssetBounds,
    ) -> Option<PreparedBatch> {
        let mut prices = [0i64; NUM_ASSETS];
        let mut carried_fresh = Vec::new();

        for asset in ASSETS {
            let history = self.history.get(asset.symbol).copied().unwrap_or_default();
            prices[asset.index] = history.last_submitted_q.unwrap_or(0);

            let Some(snapshot) = latest.get(asset.symbol) else { continue };

            let is_newer = snapshot.published_ms > history.last_submitted_ts_ms.unwrap_or(0);
            let Some(q) = quantize(snapshot.price, self.decimals) else { continue };
            let changed = Some(q) != history.last_submitted_q;

            if !(is_newer && changed) {
                continue;
            }

            let input = ValidationInput {
                price: snapshot.price,
                now_ms,
                last_submitted_price: history.last_submitted_q.map(|lq| {
                    oracle_common::fixed_point::dequantize(lq, self.decimals)
                }),
                last_submitted_ts_ms: history.last_submitted_ts_ms,
            };

            if let Err(reason) = validator::validate(&input, &bounds(asset.symbol)) {
                warn!(asset = asset.symbol, ?reason, "submit loop: validation rejected fresh price");
                continue;
            }

            prices[asset.index] = q;
            carried_fresh.push((asset.symbol, q, snapshot.published_ms));
        }

        if carried_fresh.is_empty() {
            None
        } else {
            Some(PreparedBatch { prices, carried_fresh })
        }
    }

    /// Step 6: advance submission history for every asset carried fresh in
    /// a successful submission. Non-fresh assets that were re-submitted
    /// unchanged keep their existing history (they do not advance
    /// `last_submitted_ts`).
    pub fn record_success(&mut self, carried_fresh: &[(&'static str, i64, u64)]) {
        for (symbol, q, published_ms) in carried_fresh {
            let entry = self.history.entry(symbol).or_default();
            entry.last_submitted_q = Some(*q);
            entry.last_submitted_ts_ms = Some(entry.last_submitted_ts_ms.unwrap_or(0).max(*published_ms));
        }
    }
}

pub struct Controller {
    pub updater_index: u8,
    pub decimals: u8,
    pub tick_ms: u64,
    keypair: Arc<Keypair>,
    tx_builder: Arc<TransactionBuilder>,
    bounds: BTreeMap<String, AssetBounds>,
    breaker: CircuitBreaker,
    state: SubmitState,
    latest: BTreeMap<&'static str, PriceSnapshot>,
}

pub enum TickOutcome {
    NothingFresh,
    BreakerRejected,
    Submitted { assets: Vec<&'static str> },
    AllRejected,
    Failed(SubmitError),
}

impl Controller {
    pub fn new(
        updater_index: u8,
        decimals: u8,
        tick_ms: u64,
        keypair: Arc<Keypair>,
        tx_builder: Arc<TransactionBuilder>,
        bounds: BTreeMap<String, AssetBounds>,
        breaker_config: CircuitBreakerConfig,
    ) -> Self {
        Self {
            updater_index,
            decimals,
            tick_ms,
            keypair,
            tx_builder,
            bounds,
            breaker: CircuitBreaker::new(breaker_config.failure_threshold, breaker_config.open_duration_ms),
            state: SubmitState::new(decimals),
            latest: BTreeMap::new(),
        }
    }

    fn bounds_for(&self, symbol: &str) -> AssetBounds {
        self.bounds.get(symbol).copied().unwrap_or_default()
    }

    pub fn apply_relay_update(&mut self, monotonic_ms: u64, assets: BTreeMap<String, Option<f64>>) {
        for asset in ASSETS {
            if let Some(Some(price)) = assets.get(asset.symbol) {
                self.latest.insert(asset.symbol, PriceSnapshot { price: *price, published_ms: monotonic_ms });
            }
        }
    }

    /// Runs one submit-loop tick (§4.4 steps 1-8).
    pub async fn tick(&mut self, now_ms: u64) -> TickOutcome {
        let admission = self.breaker.admit();
        if admission == Admission::Reject {
            return TickOutcome::BreakerRejected;
        }

        let bounds = |s: &str| self.bounds_for(s);
        let Some(batch) = self.state.compute_batch(&self.latest, now_ms, bounds) else {
            return TickOutcome::NothingFresh;
        };

        if batch.carried_fresh.is_empty() {
            return TickOutcome::AllRejected;
        }

        match self
            .tx_builder
            .submit_batch(&self.keypair, self.updater_index, batch.prices, now_ms as i64)
            .await
        {
            Ok(sig) => {
                self.breaker.record_success();
                let assets: Vec<&'static str> = batch.carried_fresh.iter().map(|(s, _, _)| *s).collect();
                self.state.record_success(&batch.carried_fresh);
                info!(signature = %sig, assets = ?assets, "submit loop: batch confirmed");
                TickOutcome::Submitted { assets }
            }
            Err(e) => {
                self.breaker.record_failure();
                warn!(error = %e, "submit loop: submission failed, skipping (no retry)");
                TickOutcome::Failed(e)
            }
        }
    }

    /// Drives the submit loop and relay-message intake until `shutdown`
    /// fires. The relay liveness supervisor lives in `main`, since
    /// restarting the relay means rebuilding its `AssetFeed` set, which
    /// this struct does not own.
    pub async fn run(
        mut self,
        mut relay_rx: mpsc::Receiver<RelayMessage>,
        mut last_activity: watch::Sender<Instant>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(Duration::from_millis(self.tick_ms));

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now_ms = crate::source_clients::now_ms();
                    let _ = self.tick(now_ms).await;
                }
                message = relay_rx.recv() => {
                    match message {
                        Some(RelayMessage::Heartbeat { .. }) => {
                            let _ = last_activity.send(Instant::now());
                        }
                        Some(RelayMessage::PriceUpdate { monotonic_ms, assets }) => {
                            let _ = last_activity.send(Instant::now());
                            self.apply_relay_update(monotonic_ms, assets);
                        }
                        None => {
                            warn!("controller: relay channel closed unexpectedly");
                            return;
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("controller: shutdown received");
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(price: f64, published_ms: u64) -> PriceSnapshot {
        PriceSnapshot { price, published_ms }
    }

    #[test]
    fn no_op_suppression_when_price_unchanged_at_quantization() {
        let mut state = SubmitState::new(8);
        let mut latest = BTreeMap::new();
        latest.insert("BTC", snap(50_123.45, 1_000));

        let batch = state.compute_batch(&latest, 1_000, |_| AssetBounds::default()).unwrap();
        state.record_success(&batch.carried_fresh);

        // same price, later tick -> must not resubmit (no-op suppression law, §8).
        latest.insert("BTC", snap(50_123.45, 1_750));
        assert!(state.compute_batch(&latest, 1_750, |_| AssetBounds::default()).is_none());
    }

    #[test]
    fn fresh_set_empty_when_nothing_observed() {
        let state = SubmitState::new(8);
        let latest = BTreeMap::new();
        assert!(state.compute_batch(&latest, 1_000, |_| AssetBounds::default()).is_none());
    }

    #[test]
    fn validator_rejection_excludes_asset_without_failing_whole_tick() {
        let mut state = SubmitState::new(8);
        let mut latest = BTreeMap::new();
        latest.insert("BTC", snap(50_000.0, 1_000));
        let batch = state.compute_batch(&latest, 1_000, |_| AssetBounds::default()).unwrap();
        state.record_success(&batch.carried_fresh);

        // 50% jump exceeds the default 20% max_fractional_change bound.
        latest.insert("BTC", snap(75_000.0, 2_000));
        assert!(state.compute_batch(&latest, 2_000, |_| AssetBounds::default()).is_none());
    }

    #[test]
    fn round_trip_fixed_point_fidelity_within_one_unit() {
        let mut state = SubmitState::new(8);
        let mut latest = BTreeMap::new();
        latest.insert("BTC", snap(50_123.456789, 1_000));
        let batch = state.compute_batch(&latest, 1_000, |_| AssetBounds::default()).unwrap();
        let (_, q, _) = batch.carried_fresh.iter().find(|(s, _, _)| *s == "BTC").unwrap();
        let expected = oracle_common::fixed_point::quantize(50_123.456789, 8).unwrap();
        assert!((q - expected).abs() <= 1);
    }
}
