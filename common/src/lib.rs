//! Shared, allocator-light pieces of the oracle that must agree bit-for-bit
//! across the on-chain program, the updater, and the reader: the asset
//! registry, the fixed-point conversion, the state-account/instruction byte
//! layout, and the instruction tag derivation.
//!
//! This crate intentionally has no `solana-program` dependency so it can be
//! a plain path-dependency of crates that pin different, mutually
//! incompatible Solana SDK versions.

pub mod assets;
pub mod chain;
pub mod fixed_point;
pub mod instruction_tag;
pub mod layout;

pub use assets::{Asset, Venue, ASSETS, NUM_ASSETS};
pub use layout::{state_tag, NUM_SLOTS};
