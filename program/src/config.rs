//! Compile-time program configuration: the signer allow-list and the PDA
//! seed.
//!
//! Rotating a signer or the seed is a program upgrade, never a runtime
//! operation — matching the compile-time asset registry in
//! `oracle_common::assets`.

use oracle_common::layout::NUM_SLOTS;
use solana_program::pubkey::Pubkey;

/// PDA seed for the single state account, shared with `oracle_common` so
/// off-chain readers can derive the same address without this crate.
pub use oracle_common::chain::STATE_SEED;

/// Slot `i` (1-based `updater_index`) maps to `ALLOWED_SIGNERS[i - 1]`.
///
/// Raw 32-byte arrays rather than base58 literals: these are placeholder
/// devnet keys, and a real deployment substitutes the four updaters' actual
/// pubkeys at a program upgrade.
pub const ALLOWED_SIGNERS: [Pubkey; NUM_SLOTS] = [
    Pubkey::new_from_array([1u8; 32]),
    Pubkey::new_from_array([2u8; 32]),
    Pubkey::new_from_array([3u8; 32]),
    Pubkey::new_from_array([4u8; 32]),
];

/// Returns the 0-based slot for a 1-based `updater_index`, or `None` if out
/// of the `1..=N` range.
pub fn slot_for_index(updater_index: u8) -> Option<usize> {
    if updater_index == 0 || updater_index as usize > NUM_SLOTS {
        return None;
    }
    Some(updater_index as usize - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_for_index_bounds() {
        assert_eq!(slot_for_index(0), None);
        assert_eq!(slot_for_index(1), Some(0));
        assert_eq!(slot_for_index(NUM_SLOTS as u8), Some(NUM_SLOTS - 1));
        assert_eq!(slot_for_index(NUM_SLOTS as u8 + 1), None);
    }
}
