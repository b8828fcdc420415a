//! Account fetch + decode (spec.md §4.7 "Polling"/"Decoding"): the only
//! place this crate talks to the cluster. Builds the exact `GET /api/state`
//! wire shape (§6) from a single RPC round trip.

use std::collections::BTreeMap;
use std::sync::Arc;

use oracle_common::assets::{ASSETS, NUM_ASSETS};
use oracle_common::layout::{state_size, StateView, NUM_SLOTS};
use serde::Serialize;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use tracing::warn;

use crate::aggregate::{self, AssetAggregate, AssetRow};
use crate::config::Config;

#[derive(Debug, Serialize)]
pub struct StatePayload {
    #[serde(rename = "ctxSlot")]
    pub ctx_slot: u64,
    pub pda: String,
    pub exists: bool,
    pub decimals: u8,
    pub groups: BTreeMap<&'static str, Vec<AssetRow>>,
    pub agg: BTreeMap<&'static str, Option<AssetAggregate>>,
    #[serde(rename = "latestTs")]
    pub latest_ts: BTreeMap<&'static str, Option<i64>>,
}

impl StatePayload {
    /// The "account absent / undersized" payload (§4.7: "report ... without
    /// throwing" — never an HTTP error, just an empty snapshot).
    fn empty(ctx_slot: u64, pda: String) -> Self {
        let mut groups = BTreeMap::new();
        let mut agg = BTreeMap::new();
        let mut latest_ts = BTreeMap::new();
        for asset in ASSETS {
            groups.insert(asset.symbol, Vec::new());
            agg.insert(asset.symbol, None);
            latest_ts.insert(asset.symbol, None);
        }
        Self { ctx_slot, pda, exists: false, decimals: 0, groups, agg, latest_ts }
    }
}

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Resolves the decimals this process renders with (spec.md §9 "decimals
/// mismatch"). An explicit override always wins — it is the operator
/// acknowledging a known mismatch. Absent an override, the on-chain value
/// must equal `expected_decimals`; a silent mismatch is exactly the bug
/// the spec calls out, so it is a configuration error instead.
fn effective_decimals(on_chain: u8, expected: u8, override_value: Option<u8>) -> Result<u8, FetchError> {
    if let Some(d) = override_value {
        return Ok(d);
    }
    if on_chain != expected {
        return Err(FetchError::DecimalsMismatch { expected, on_chain });
    }
    Ok(on_chain)
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("rpc error: {0}")]
    Rpc(#[from] solana_client::client_error::ClientError),
    #[error(
        "on-chain decimals ({on_chain}) does not match configured expected_decimals \
         ({expected}); set DASHBOARD_DECIMALS_OVERRIDE to acknowledge"
    )]
    DecimalsMismatch { expected: u8, on_chain: u8 },
    #[error("state account at {pda} is owned by {actual}, expected {expected}")]
    WrongOwner { pda: String, expected: Pubkey, actual: Pubkey },
}

pub struct StateFetcher {
    rpc: RpcClient,
    program_id: Pubkey,
    state_pda: Pubkey,
    expected_decimals: u8,
    decimals_override: Option<u8>,
}

impl StateFetcher {
    pub fn new(cfg: &Config, program_id: Pubkey, state_pda: Pubkey) -> Self {
        Self {
            rpc: RpcClient::new_with_commitment(cfg.rpc_url.clone(), CommitmentConfig::processed()),
            program_id,
            state_pda,
            expected_decimals: cfg.expected_decimals,
            decimals_override: cfg.decimals_override,
        }
    }

    /// Fetches and decodes the current snapshot. RPC transport failures, an
    /// account owned by a program other than `program_id`, and an
    /// unacknowledged decimals mismatch are the only errors this returns —
    /// a missing or undersized account is a normal (if degraded) result,
    /// not an error (§4.7).
    pub async fn fetch(&self) -> Result<StatePayload, FetchError> {
        let pda = self.state_pda.to_string();
        let response = self
            .rpc
            .get_account_with_commitment(&self.state_pda, CommitmentConfig::processed())
            .await?;
        let ctx_slot = response.context.slot;

        let Some(account) = response.value else {
            return Ok(StatePayload::empty(ctx_slot, pda));
        };

        if account.owner != self.program_id {
            return Err(FetchError::WrongOwner { pda, expected: self.program_id, actual: account.owner });
        }

        let expected = state_size(NUM_ASSETS);
        if account.data.len() < expected {
            warn!(got = account.data.len(), expected, "state account too small");
            return Ok(StatePayload::empty(ctx_slot, pda));
        }

        let view = match StateView::new(&account.data, NUM_ASSETS) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "state account failed layout validation");
                return Ok(StatePayload::empty(ctx_slot, pda));
            }
        };

        let decimals = effective_decimals(view.decimals(), self.expected_decimals, self.decimals_override)?;
        let now = now_ms();

        let mut groups = BTreeMap::new();
        let mut agg = BTreeMap::new();
        let mut latest_ts = BTreeMap::new();

        for asset in ASSETS {
            let raw: Vec<(i64, i64)> = (0..NUM_SLOTS)
                .map(|slot| (view.price(asset.index, slot).unwrap_or(0), view.ts(asset.index, slot).unwrap_or(0)))
                .collect();
            let summary = aggregate::summarize(&raw, decimals, now);
            groups.insert(asset.symbol, summary.rows);
            agg.insert(asset.symbol, summary.aggregate);
            latest_ts.insert(asset.symbol, summary.latest_ts);
        }

        Ok(StatePayload { ctx_slot, pda, exists: true, decimals, groups, agg, latest_ts })
    }
}

pub type SharedStateFetcher = Arc<StateFetcher>;
