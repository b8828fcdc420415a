//! Transaction builder (C5): blockhash cache, batch-instruction assembly,
//! submission, and error classification.
//!
//! Grounded on `SolanaTransactionManager::get_recent_blockhash`'s
//! refresh-on-demand idiom, trimmed from a 5-entry ring down to the spec's
//! single cached value with an explicit `max_age_ms` gate, and on its
//! `build_transaction`'s compute-budget prelude.

use std::sync::Arc;
use std::time::{Duration, Instant};

use oracle_common::assets::NUM_ASSETS;
use oracle_program::instructions::OracleInstruction;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    compute_budget::ComputeBudgetInstruction,
    hash::Hash,
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    system_program,
    transaction::Transaction,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::SubmitError;
use crate::rpc::RpcDriver;

const COMPUTE_UNIT_LIMIT: u32 = 40_000;

/// Size-1 blockhash cache, refreshed only when older than `max_age_ms`
/// (default 2000 ms per §4.5).
struct BlockhashCache {
    cached: Mutex<Option<(Hash, Instant)>>,
}

impl BlockhashCache {
    fn new() -> Self {
        Self { cached: Mutex::new(None) }
    }

    async fn ensure_fresh(&self, rpc: &RpcDriver, max_age_ms: u64) -> Result<Hash, SubmitError> {
        let mut guard = self.cached.lock().await;
        if let Some((hash, fetched_at)) = *guard {
            if fetched_at.elapsed() < Duration::from_millis(max_age_ms) {
                return Ok(hash);
            }
        }

        let hash = rpc
            .get_latest_blockhash()
            .await
            .map_err(|e| SubmitError::classify(&e))?;
        *guard = Some((hash, Instant::now()));
        Ok(hash)
    }
}

/// Owns the blockhash cache and the RPC driver; one instance per
/// controller process.
pub struct TransactionBuilder {
    rpc: Arc<RpcDriver>,
    program_id: Pubkey,
    state_pda: Pubkey,
    blockhash: BlockhashCache,
}

impl TransactionBuilder {
    pub fn new(rpc: Arc<RpcDriver>, program_id: Pubkey, state_pda: Pubkey) -> Self {
        Self { rpc, program_id, state_pda, blockhash: BlockhashCache::new() }
    }

    /// Returns a recent blockhash, fetching a new one only if the cached
    /// one is older than `max_age_ms` (§4.5).
    pub async fn ensure_blockhash_fresh(&self, max_age_ms: u64) -> Result<Hash, SubmitError> {
        self.blockhash.ensure_fresh(&self.rpc, max_age_ms).await
    }

    fn batch_set_prices_instruction(
        &self,
        signer: &Pubkey,
        updater_index: u8,
        prices: [i64; NUM_ASSETS],
        client_ts_ms: i64,
    ) -> Instruction {
        let data = OracleInstruction::BatchSetPrices { updater_index, prices, client_ts_ms }.pack();
        Instruction {
            program_id: self.program_id,
            accounts: vec![
                AccountMeta::new(self.state_pda, false),
                AccountMeta::new_readonly(*signer, true),
            ],
            data,
        }
    }

    /// Constructs, signs, submits, and awaits `processed`-commitment
    /// confirmation for a `batch_set_prices` instruction, prefixed with a
    /// compute-unit-limit instruction (§4.5).
    pub async fn submit_batch(
        &self,
        keypair: &Keypair,
        updater_index: u8,
        prices: [i64; NUM_ASSETS],
        client_ts_ms: i64,
    ) -> Result<Signature, SubmitError> {
        let blockhash = self.ensure_blockhash_fresh(2_000).await?;
        let signer = keypair.pubkey();

        let instructions = vec![
            ComputeBudgetInstruction::set_compute_unit_limit(COMPUTE_UNIT_LIMIT),
            self.batch_set_prices_instruction(&signer, updater_index, prices, client_ts_ms),
        ];

        let mut tx = Transaction::new_with_payer(&instructions, Some(&signer));
        tx.sign(&[keypair], blockhash);

        match self.rpc.send_and_confirm(&tx).await {
            Ok(sig) => {
                info!(updater_index, signature = %sig, "submit_batch: confirmed");
                Ok(sig)
            }
            Err(e) => {
                let classified = SubmitError::classify(&e);
                if classified.is_transient() {
                    warn!(updater_index, error = %e, "submit_batch: transient failure, not retrying");
                } else {
                    warn!(updater_index, error = %e, "submit_batch: permanent failure");
                }
                Err(classified)
            }
        }
    }

    /// Submits the `initialize` instruction (live-mode startup only, when
    /// this updater's key is also the configured `update_authority`;
    /// deployments where that isn't true must bail out instead, per §4.5).
    pub async fn submit_initialize(
        &self,
        payer: &Keypair,
        decimals: u8,
    ) -> Result<Signature, SubmitError> {
        let blockhash = self.ensure_blockhash_fresh(2_000).await?;
        let data = OracleInstruction::Initialize {
            update_authority: payer.pubkey().to_bytes(),
            decimals,
        }
        .pack();

        let instruction = Instruction {
            program_id: self.program_id,
            accounts: vec![
                AccountMeta::new(self.state_pda, false),
                AccountMeta::new(payer.pubkey(), true),
                AccountMeta::new_readonly(system_program::id(), false),
            ],
            data,
        };

        let mut tx = Transaction::new_with_payer(&[instruction], Some(&payer.pubkey()));
        tx.sign(&[payer], blockhash);

        self.rpc
            .send_and_confirm(&tx)
            .await
            .map_err(|e| SubmitError::classify(&e))
    }

    pub async fn account_exists(&self) -> bool {
        self.rpc.account_exists(&self.state_pda).await
    }

    pub fn commitment() -> CommitmentConfig {
        CommitmentConfig::processed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blockhash_cache_refreshes_only_when_stale() {
        // exercised indirectly through TransactionBuilder in integration
        // tests; here we only assert the cache starts empty.
        let cache = BlockhashCache::new();
        assert!(cache.cached.lock().await.is_none());
    }
}
