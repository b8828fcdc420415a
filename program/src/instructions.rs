//! Instruction encoding: little-endian, fixed-width, no length prefixes.
//!
//! Deliberately hand-rolled rather than `borsh`-derived: the wire format is
//! pinned byte-for-byte (8-byte tag, then fixed-width fields) so an
//! off-chain decoder can reproduce it without depending on this crate.
//! `oracle_common::instruction_tag` is the single source of truth for the
//! tag bytes on both ends.

use oracle_common::assets::NUM_ASSETS;
use oracle_common::instruction_tag::instruction_tag;
use solana_program::program_error::ProgramError;

use crate::error::OracleError;

pub const TAG_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub enum OracleInstruction {
    /// `initialize(update_authority: Pubkey, decimals: u8)`.
    Initialize { update_authority: [u8; 32], decimals: u8 },
    /// `batch_set_prices(updater_index: u8, price[0..A]: i64, client_ts_ms: i64)`.
    BatchSetPrices {
        updater_index: u8,
        prices: [i64; NUM_ASSETS],
        client_ts_ms: i64,
    },
    /// `close_state()`.
    CloseState,
}

fn tag_matches(data: &[u8], name: &str) -> bool {
    data.len() >= TAG_LEN && data[0..TAG_LEN] == instruction_tag(name)
}

impl OracleInstruction {
    pub fn unpack(data: &[u8]) -> Result<Self, ProgramError> {
        if data.len() < TAG_LEN {
            return Err(OracleError::UnknownInstruction.into());
        }

        if tag_matches(data, "initialize") {
            let rest = &data[TAG_LEN..];
            if rest.len() != 32 + 1 {
                return Err(OracleError::InvalidInstructionData.into());
            }
            let mut update_authority = [0u8; 32];
            update_authority.copy_from_slice(&rest[0..32]);
            let decimals = rest[32];
            return Ok(Self::Initialize { update_authority, decimals });
        }

        if tag_matches(data, "batch_set_prices") {
            let rest = &data[TAG_LEN..];
            let expected = 1 + NUM_ASSETS * 8 + 8;
            if rest.len() != expected {
                return Err(OracleError::InvalidInstructionData.into());
            }
            let updater_index = rest[0];
            let mut prices = [0i64; NUM_ASSETS];
            for (i, slot) in prices.iter_mut().enumerate() {
                let off = 1 + i * 8;
                *slot = i64::from_le_bytes(rest[off..off + 8].try_into().unwrap());
            }
            let ts_off = 1 + NUM_ASSETS * 8;
            let client_ts_ms = i64::from_le_bytes(rest[ts_off..ts_off + 8].try_into().unwrap());
            return Ok(Self::BatchSetPrices { updater_index, prices, client_ts_ms });
        }

        if tag_matches(data, "close_state") {
            if data.len() != TAG_LEN {
                return Err(OracleError::InvalidInstructionData.into());
            }
            return Ok(Self::CloseState);
        }

        Err(OracleError::UnknownInstruction.into())
    }

    /// Encodes this instruction's data, mirroring `unpack`. Used by the
    /// off-chain transaction builder (`updater::tx_builder`) and by tests
    /// here for round-trip checks.
    pub fn pack(&self) -> Vec<u8> {
        match self {
            Self::Initialize { update_authority, decimals } => {
                let mut out = Vec::with_capacity(TAG_LEN + 32 + 1);
                out.extend_from_slice(&instruction_tag("initialize"));
                out.extend_from_slice(update_authority);
                out.push(*decimals);
                out
            }
            Self::BatchSetPrices { updater_index, prices, client_ts_ms } => {
                let mut out = Vec::with_capacity(TAG_LEN + 1 + NUM_ASSETS * 8 + 8);
                out.extend_from_slice(&instruction_tag("batch_set_prices"));
                out.push(*updater_index);
                for p in prices {
                    out.extend_from_slice(&p.to_le_bytes());
                }
                out.extend_from_slice(&client_ts_ms.to_le_bytes());
                out
            }
            Self::CloseState => instruction_tag("close_state").to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_set_prices_round_trips() {
        let mut prices = [0i64; NUM_ASSETS];
        prices[0] = 5_012_345_000_000;
        let ix = OracleInstruction::BatchSetPrices {
            updater_index: 1,
            prices,
            client_ts_ms: 1_000,
        };
        let packed = ix.pack();
        let unpacked = OracleInstruction::unpack(&packed).unwrap();
        assert_eq!(ix, unpacked);
    }

    #[test]
    fn initialize_round_trips() {
        let ix = OracleInstruction::Initialize { update_authority: [7u8; 32], decimals: 8 };
        assert_eq!(ix, OracleInstruction::unpack(&ix.pack()).unwrap());
    }

    #[test]
    fn close_state_round_trips() {
        let ix = OracleInstruction::CloseState;
        assert_eq!(ix, OracleInstruction::unpack(&ix.pack()).unwrap());
    }

    #[test]
    fn rejects_unknown_tag() {
        let bad = [0u8; TAG_LEN];
        assert!(OracleInstruction::unpack(&bad).is_err());
    }

    #[test]
    fn rejects_truncated_payload() {
        let tag = instruction_tag("initialize");
        assert!(OracleInstruction::unpack(&tag).is_err());
    }
}
