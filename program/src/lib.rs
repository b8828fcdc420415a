//! On-chain price oracle state account program — native Solana, no Anchor.
//!
//! Three instructions: `initialize`, `batch_set_prices`, `close_state`.
//! The account is a single fixed-layout PDA; see
//! `oracle_common::layout` for the byte-exact offsets this program and the
//! off-chain reader both compute from, so schema drift between the two is
//! a compile error rather than a runtime surprise.

use solana_program::entrypoint;

pub mod config;
pub mod error;
pub mod instructions;
pub mod processor;

use processor::process_instruction;

solana_program::declare_id!("6M8NGkCnQR6WutaLsY1ugaiGZR3jTnBt4PuE6ULNPdha");

#[cfg(not(feature = "no-entrypoint"))]
entrypoint!(process_instruction);

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[test]
    fn declared_id_matches_shared_constant() {
        // `declare_id!` needs a string literal, so `oracle_common::chain`
        // carries its own copy for `updater`/`reader` to parse. Keep them
        // in sync here rather than at runtime.
        let shared = solana_program::pubkey::Pubkey::from_str(oracle_common::chain::PROGRAM_ID_BASE58)
            .expect("PROGRAM_ID_BASE58 must be valid base58");
        assert_eq!(shared, crate::id());
    }
}
