//! Program-derived address for the single oracle state account.
//!
//! The seed lives in `oracle_common::chain` so this crate and `reader`
//! derive the identical address without sharing a Solana SDK version with
//! `oracle-program`.

use oracle_common::chain::STATE_SEED;
use solana_sdk::pubkey::Pubkey;

pub fn derive_state_pda(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[STATE_SEED], program_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let program_id = Pubkey::new_unique();
        assert_eq!(derive_state_pda(&program_id), derive_state_pda(&program_id));
    }
}
