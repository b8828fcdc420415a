//! The two constants that bind the on-chain program and every off-chain
//! reader of its PDA together: the deployed program id and the PDA seed
//! derived independently.
//!
//! Kept here, rather than only in `oracle-program`, because this crate has
//! no `solana-program` dependency and so can be a plain path-dependency of
//! `updater` and `reader`, which pin their own (mutually incompatible)
//! Solana SDK crate versions. `oracle-program`'s own tests assert that its
//! `declare_id!` literal matches `PROGRAM_ID_BASE58` byte-for-byte.

/// PDA seed for the single state account.
pub const STATE_SEED: &[u8] = b"oracle-state-v1";

/// Base58 program id, duplicated as a string literal in
/// `oracle_program::declare_id!` since that macro requires a literal.
pub const PROGRAM_ID_BASE58: &str = "6M8NGkCnQR6WutaLsY1ugaiGZR3jTnBt4PuE6ULNPdha";
