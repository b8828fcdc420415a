//! Bit-exact state-account layout.
//!
//! The program and the reader both depend on this module so the computed
//! size and offsets can never drift apart between the two.
//!
//! No heap allocation, no floats, no variable-length data — every accessor
//! here operates on borrowed byte slices.

use crate::assets::NUM_ASSETS;

/// N — number of updater slots per asset.
pub const NUM_SLOTS: usize = 4;

const TAG_LEN: usize = 8;
const AUTHORITY_LEN: usize = 32;
const I64_LEN: usize = 8;

/// S — bytes per asset triplet: N price i64s followed by N timestamp i64s.
pub const TRIPLET_SIZE: usize = 2 * I64_LEN * NUM_SLOTS;

const HEADER_LEN: usize = TAG_LEN + AUTHORITY_LEN; // 40
const TRAILER_LEN: usize = 2; // decimals + bump

/// Account-type tag, derived the same way as instruction tags
/// (`instruction_tag::account_tag`) so a reader never needs the program's
/// source to recognize the account.
pub fn state_tag() -> [u8; 8] {
    crate::instruction_tag::account_tag("OracleState")
}

/// Total state-account size for `num_assets` assets. A `const fn` so both
/// the program (at compile time, for account creation) and the reader (at
/// runtime, for size validation) get the identical value.
pub const fn state_size(num_assets: usize) -> usize {
    HEADER_LEN + num_assets * TRIPLET_SIZE + TRAILER_LEN
}

/// The size for the compile-time asset list this workspace ships.
pub const STATE_SIZE: usize = state_size(NUM_ASSETS);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("state account too small: got {got} bytes, expected {expected}")]
    TooSmall { got: usize, expected: usize },
    #[error("asset index {0} out of range")]
    BadAssetIndex(usize),
    #[error("slot index {0} out of range")]
    BadSlotIndex(usize),
}

fn price_offset(asset_idx: usize, slot_idx: usize) -> usize {
    HEADER_LEN + asset_idx * TRIPLET_SIZE + slot_idx * I64_LEN
}

fn ts_offset(asset_idx: usize, slot_idx: usize) -> usize {
    HEADER_LEN + asset_idx * TRIPLET_SIZE + NUM_SLOTS * I64_LEN + slot_idx * I64_LEN
}

fn decimals_offset(num_assets: usize) -> usize {
    HEADER_LEN + num_assets * TRIPLET_SIZE
}

fn bump_offset(num_assets: usize) -> usize {
    decimals_offset(num_assets) + 1
}

fn check_indices(num_assets: usize, asset_idx: usize, slot_idx: usize) -> Result<(), LayoutError> {
    if asset_idx >= num_assets {
        return Err(LayoutError::BadAssetIndex(asset_idx));
    }
    if slot_idx >= NUM_SLOTS {
        return Err(LayoutError::BadSlotIndex(slot_idx));
    }
    Ok(())
}

/// Read-only view over a decoded (or raw) state-account buffer.
///
/// Symmetric under permutation of the N slot indices: every accessor
/// takes `slot_idx` as a plain argument, nothing here assumes an order
/// across slots.
pub struct StateView<'a> {
    data: &'a [u8],
    num_assets: usize,
}

impl<'a> StateView<'a> {
    /// Rejects a buffer shorter than `state_size(num_assets)`.
    pub fn new(data: &'a [u8], num_assets: usize) -> Result<Self, LayoutError> {
        let expected = state_size(num_assets);
        if data.len() < expected {
            return Err(LayoutError::TooSmall {
                got: data.len(),
                expected,
            });
        }
        Ok(Self { data, num_assets })
    }

    pub fn tag(&self) -> &[u8] {
        &self.data[0..TAG_LEN]
    }

    pub fn update_authority(&self) -> &[u8] {
        &self.data[TAG_LEN..HEADER_LEN]
    }

    pub fn decimals(&self) -> u8 {
        self.data[decimals_offset(self.num_assets)]
    }

    pub fn bump(&self) -> u8 {
        self.data[bump_offset(self.num_assets)]
    }

    pub fn price(&self, asset_idx: usize, slot_idx: usize) -> Result<i64, LayoutError> {
        check_indices(self.num_assets, asset_idx, slot_idx)?;
        let off = price_offset(asset_idx, slot_idx);
        Ok(i64::from_le_bytes(self.data[off..off + I64_LEN].try_into().unwrap()))
    }

    pub fn ts(&self, asset_idx: usize, slot_idx: usize) -> Result<i64, LayoutError> {
        check_indices(self.num_assets, asset_idx, slot_idx)?;
        let off = ts_offset(asset_idx, slot_idx);
        Ok(i64::from_le_bytes(self.data[off..off + I64_LEN].try_into().unwrap()))
    }
}

/// Mutable view, used only by the on-chain program. One asset's price and
/// timestamp slot are written atomically within a single instruction
/// execution — callers write both fields before returning.
pub struct StateViewMut<'a> {
    data: &'a mut [u8],
    num_assets: usize,
}

impl<'a> StateViewMut<'a> {
    pub fn new(data: &'a mut [u8], num_assets: usize) -> Result<Self, LayoutError> {
        let expected = state_size(num_assets);
        if data.len() < expected {
            return Err(LayoutError::TooSmall {
                got: data.len(),
                expected,
            });
        }
        Ok(Self { data, num_assets })
    }

    pub fn set_tag(&mut self, tag: [u8; 8]) {
        self.data[0..TAG_LEN].copy_from_slice(&tag);
    }

    pub fn set_update_authority(&mut self, authority: [u8; 32]) {
        self.data[TAG_LEN..HEADER_LEN].copy_from_slice(&authority);
    }

    pub fn set_decimals(&mut self, decimals: u8) {
        self.data[decimals_offset(self.num_assets)] = decimals;
    }

    pub fn set_bump(&mut self, bump: u8) {
        self.data[bump_offset(self.num_assets)] = bump;
    }

    /// Writes the price and server-observed timestamp for one (asset, slot)
    /// pair. Called once per asset per `batch_set_prices` execution; the two
    /// writes land in the same instruction so readers never observe a torn
    /// state.
    pub fn set_slot(
        &mut self,
        asset_idx: usize,
        slot_idx: usize,
        price_q: i64,
        ts_ms: i64,
    ) -> Result<(), LayoutError> {
        check_indices(self.num_assets, asset_idx, slot_idx)?;
        let p_off = price_offset(asset_idx, slot_idx);
        self.data[p_off..p_off + I64_LEN].copy_from_slice(&price_q.to_le_bytes());
        let t_off = ts_offset(asset_idx, slot_idx);
        self.data[t_off..t_off + I64_LEN].copy_from_slice(&ts_ms.to_le_bytes());
        Ok(())
    }

    /// Zero-fills the whole buffer (used by `close_state`).
    pub fn zero_fill(&mut self) {
        self.data.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worked_example_sizes() {
        // A=10, N=4, S=64 -> 682 bytes; A=8, N=4 -> 554 bytes.
        assert_eq!(TRIPLET_SIZE, 64);
        assert_eq!(state_size(10), 682);
        assert_eq!(state_size(8), 554);
    }

    #[test]
    fn offsets_match_layout_formula() {
        // offset = 40 + a*S + i*8 for price, + N*8 for timestamp.
        assert_eq!(price_offset(0, 0), 40);
        assert_eq!(price_offset(0, 1), 48);
        assert_eq!(ts_offset(0, 0), 40 + NUM_SLOTS * 8);
        assert_eq!(price_offset(1, 0), 40 + TRIPLET_SIZE);
    }

    #[test]
    fn read_write_round_trip_is_slot_symmetric() {
        let num_assets = 3;
        let mut buf = vec![0u8; state_size(num_assets)];
        {
            let mut view = StateViewMut::new(&mut buf, num_assets).unwrap();
            view.set_decimals(8);
            view.set_slot(0, 3, 5_012_345_000_000, 1_700_000_000_000).unwrap();
            view.set_slot(2, 0, 42, 7).unwrap();
        }
        let view = StateView::new(&buf, num_assets).unwrap();
        assert_eq!(view.decimals(), 8);
        assert_eq!(view.price(0, 3).unwrap(), 5_012_345_000_000);
        assert_eq!(view.ts(0, 3).unwrap(), 1_700_000_000_000);
        assert_eq!(view.price(2, 0).unwrap(), 42);
        // untouched slots are still zero regardless of which slot index was written.
        assert_eq!(view.price(0, 0).unwrap(), 0);
        assert_eq!(view.price(1, 1).unwrap(), 0);
    }

    #[test]
    fn rejects_undersized_buffer() {
        let buf = vec![0u8; 10];
        assert_eq!(
            StateView::new(&buf, 3).unwrap_err(),
            LayoutError::TooSmall {
                got: 10,
                expected: state_size(3)
            }
        );
    }

    #[test]
    fn rejects_out_of_range_indices() {
        let buf = vec![0u8; state_size(2)];
        let view = StateView::new(&buf, 2).unwrap();
        assert_eq!(view.price(2, 0).unwrap_err(), LayoutError::BadAssetIndex(2));
        assert_eq!(view.price(0, NUM_SLOTS).unwrap_err(), LayoutError::BadSlotIndex(NUM_SLOTS));
    }
}
