//! Rejection reasons for `batch_set_prices` and the other two instructions,
//! each surfaced as a distinct custom program error code.

use solana_program::program_error::ProgramError;
use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("instruction tag did not match any known instruction")]
    UnknownInstruction,

    #[error("instruction data was malformed for its tag")]
    InvalidInstructionData,

    #[error("state account already exists")]
    AlreadyInitialized,

    #[error("state account does not match the expected size")]
    StateSizeMismatch,

    #[error("updater_index outside 1..=N")]
    BadIndex,

    #[error("signer key does not match the allow-listed slot")]
    UnauthorizedSigner,

    #[error("update_authority does not match the account's authority")]
    InvalidAuthority,

    #[error("arithmetic overflow while deriving the PDA or account size")]
    Overflow,
}

impl From<OracleError> for ProgramError {
    fn from(e: OracleError) -> Self {
        ProgramError::Custom(e as u32)
    }
}
