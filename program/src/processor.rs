//! Instruction dispatch and the three handlers.
//!
//! No allocator, no variable-length data, no floats on the write path — the
//! state account is read and written through `oracle_common::layout`'s
//! explicit byte offsets rather than a `try_from_slice`/`try_to_vec` round
//! trip, to keep execution deterministic across validator versions.

use oracle_common::assets::NUM_ASSETS;
use oracle_common::layout::{state_size, state_tag, StateView, StateViewMut};
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::invoke_signed,
    program_error::ProgramError,
    pubkey::Pubkey,
    rent::Rent,
    sysvar::{clock::Clock, Sysvar},
    system_instruction,
};

use crate::{
    config::{slot_for_index, ALLOWED_SIGNERS, STATE_SEED},
    error::OracleError,
    instructions::OracleInstruction,
};

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    let instruction = OracleInstruction::unpack(instruction_data)?;

    match instruction {
        OracleInstruction::Initialize { update_authority, decimals } => {
            msg!("Instruction: Initialize");
            process_initialize(program_id, accounts, update_authority, decimals)
        }
        OracleInstruction::BatchSetPrices { updater_index, prices, client_ts_ms } => {
            msg!("Instruction: BatchSetPrices");
            process_batch_set_prices(program_id, accounts, updater_index, prices, client_ts_ms)
        }
        OracleInstruction::CloseState => {
            msg!("Instruction: CloseState");
            process_close_state(program_id, accounts)
        }
    }
}

fn derive_state_pda(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[STATE_SEED], program_id)
}

/// Creates the account at the PDA with the computed fixed size, rejects if
/// it already exists.
fn process_initialize(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    update_authority: [u8; 32],
    decimals: u8,
) -> ProgramResult {
    let iter = &mut accounts.iter();
    let state_info = next_account_info(iter)?;
    let payer_info = next_account_info(iter)?;
    let system_program = next_account_info(iter)?;

    if !payer_info.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }

    let (expected_pda, bump) = derive_state_pda(program_id);
    if state_info.key != &expected_pda {
        return Err(ProgramError::InvalidSeeds);
    }

    // The account is created once with its full size and never resized.
    if state_info.owner == program_id && !state_info.data_is_empty() {
        return Err(OracleError::AlreadyInitialized.into());
    }

    let size = state_size(NUM_ASSETS);
    let rent = Rent::get()?;
    let required_lamports = rent.minimum_balance(size);

    invoke_signed(
        &system_instruction::create_account(
            payer_info.key,
            state_info.key,
            required_lamports,
            size as u64,
            program_id,
        ),
        &[payer_info.clone(), state_info.clone(), system_program.clone()],
        &[&[STATE_SEED, &[bump]]],
    )?;

    let mut data = state_info.data.borrow_mut();
    let mut view = StateViewMut::new(&mut data, NUM_ASSETS).map_err(|_| OracleError::StateSizeMismatch)?;
    view.set_tag(state_tag());
    view.set_update_authority(update_authority);
    view.set_decimals(decimals);
    view.set_bump(bump);
    // every price/timestamp slot starts at zero because `create_account`
    // zero-fills new account data; no explicit write needed here.

    msg!("oracle state initialized, decimals={}", decimals);
    Ok(())
}

/// Allow-list check, then one atomic price+timestamp write per asset for
/// this updater's slot.
fn process_batch_set_prices(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    updater_index: u8,
    prices: [i64; NUM_ASSETS],
    client_ts_ms: i64,
) -> ProgramResult {
    let iter = &mut accounts.iter();
    let state_info = next_account_info(iter)?;
    let signer_info = next_account_info(iter)?;

    if !signer_info.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }

    let (expected_pda, _bump) = derive_state_pda(program_id);
    if state_info.key != &expected_pda {
        return Err(ProgramError::InvalidSeeds);
    }

    let slot_idx = slot_for_index(updater_index).ok_or(OracleError::BadIndex)?;
    if signer_info.key != &ALLOWED_SIGNERS[slot_idx] {
        return Err(OracleError::UnauthorizedSigner.into());
    }

    let clock = Clock::get()?;
    // Server clock only — client_ts_ms is accepted for observability (logged
    // below) but never stored, to keep the account immune to clock skew.
    let server_ts_ms = clock
        .unix_timestamp
        .checked_mul(1000)
        .ok_or(OracleError::Overflow)?;

    let mut data = state_info.data.borrow_mut();
    let mut view = StateViewMut::new(&mut data, NUM_ASSETS).map_err(|_| OracleError::StateSizeMismatch)?;

    for (asset_idx, price_q) in prices.iter().enumerate() {
        view.set_slot(asset_idx, slot_idx, *price_q, server_ts_ms)
            .map_err(|_| OracleError::Overflow)?;
    }

    msg!(
        "batch_set_prices: updater_index={} server_ts_ms={} client_ts_ms={}",
        updater_index,
        server_ts_ms,
        client_ts_ms
    );
    Ok(())
}

/// Transfers all lamports to `recipient` and zero-fills the data; used for
/// schema migration.
fn process_close_state(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
    let iter = &mut accounts.iter();
    let state_info = next_account_info(iter)?;
    let authority_info = next_account_info(iter)?;
    let recipient_info = next_account_info(iter)?;

    if !authority_info.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }

    let (expected_pda, _bump) = derive_state_pda(program_id);
    if state_info.key != &expected_pda {
        return Err(ProgramError::InvalidSeeds);
    }

    {
        let data = state_info.data.borrow();
        let view = StateView::new(&data, NUM_ASSETS).map_err(|_| OracleError::StateSizeMismatch)?;
        if view.update_authority() != authority_info.key.as_ref() {
            return Err(OracleError::InvalidAuthority.into());
        }
    }

    let state_lamports = state_info.lamports();
    **recipient_info.lamports.borrow_mut() = recipient_info
        .lamports()
        .checked_add(state_lamports)
        .ok_or(OracleError::Overflow)?;
    **state_info.lamports.borrow_mut() = 0;

    let mut data = state_info.data.borrow_mut();
    data.fill(0);

    msg!("oracle state closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_program::account_info::AccountInfo;

    struct TestAccount {
        lamports: u64,
        data: Vec<u8>,
        owner: Pubkey,
    }

    fn account_info<'a>(key: &'a Pubkey, is_signer: bool, acc: &'a mut TestAccount) -> AccountInfo<'a> {
        AccountInfo::new(key, is_signer, true, &mut acc.lamports, &mut acc.data, &acc.owner, false, 0)
    }

    #[test]
    fn batch_set_prices_rejects_bad_index() {
        let program_id = Pubkey::new_unique();
        let (state_key, _bump) = derive_state_pda(&program_id);
        let signer_key = Pubkey::new_unique();

        let mut state_acc = TestAccount { lamports: 0, data: vec![0u8; state_size(NUM_ASSETS)], owner: program_id };
        let mut signer_acc = TestAccount { lamports: 0, data: vec![], owner: program_id };
        let accounts = vec![
            account_info(&state_key, false, &mut state_acc),
            account_info(&signer_key, true, &mut signer_acc),
        ];

        let err = process_batch_set_prices(&program_id, &accounts, 0, [0i64; NUM_ASSETS], 0).unwrap_err();
        assert_eq!(err, ProgramError::from(OracleError::BadIndex));

        let err = process_batch_set_prices(&program_id, &accounts, 5, [0i64; NUM_ASSETS], 0).unwrap_err();
        assert_eq!(err, ProgramError::from(OracleError::BadIndex));
    }

    #[test]
    fn batch_set_prices_rejects_unauthorized_signer() {
        let program_id = Pubkey::new_unique();
        let (state_key, _bump) = derive_state_pda(&program_id);
        let random_signer = Pubkey::new_unique();

        let mut state_acc = TestAccount { lamports: 0, data: vec![0u8; state_size(NUM_ASSETS)], owner: program_id };
        let mut signer_acc = TestAccount { lamports: 0, data: vec![], owner: program_id };
        let accounts = vec![
            account_info(&state_key, false, &mut state_acc),
            account_info(&random_signer, true, &mut signer_acc),
        ];

        let err = process_batch_set_prices(&program_id, &accounts, 1, [0i64; NUM_ASSETS], 0).unwrap_err();
        assert_eq!(err, ProgramError::from(OracleError::UnauthorizedSigner));
    }

    #[test]
    fn batch_set_prices_requires_signature() {
        let program_id = Pubkey::new_unique();
        let (state_key, _bump) = derive_state_pda(&program_id);

        let mut state_acc = TestAccount { lamports: 0, data: vec![0u8; state_size(NUM_ASSETS)], owner: program_id };
        let mut signer_acc = TestAccount { lamports: 0, data: vec![], owner: program_id };
        let accounts = vec![
            account_info(&state_key, false, &mut state_acc),
            account_info(&ALLOWED_SIGNERS[0], false, &mut signer_acc),
        ];

        let err = process_batch_set_prices(&program_id, &accounts, 1, [0i64; NUM_ASSETS], 0).unwrap_err();
        assert_eq!(err, ProgramError::MissingRequiredSignature);
    }

    #[test]
    fn close_state_rejects_mismatched_authority() {
        let program_id = Pubkey::new_unique();
        let (state_key, bump) = derive_state_pda(&program_id);
        let real_authority = Pubkey::new_unique();
        let wrong_authority = Pubkey::new_unique();
        let recipient_key = Pubkey::new_unique();

        let mut data = vec![0u8; state_size(NUM_ASSETS)];
        {
            let mut view = StateViewMut::new(&mut data, NUM_ASSETS).unwrap();
            view.set_tag(state_tag());
            view.set_update_authority(real_authority.to_bytes());
            view.set_decimals(8);
            view.set_bump(bump);
        }

        let mut state_acc = TestAccount { lamports: 1_000, data, owner: program_id };
        let mut authority_acc = TestAccount { lamports: 0, data: vec![], owner: program_id };
        let mut recipient_acc = TestAccount { lamports: 0, data: vec![], owner: program_id };
        let accounts = vec![
            account_info(&state_key, false, &mut state_acc),
            account_info(&wrong_authority, true, &mut authority_acc),
            account_info(&recipient_key, false, &mut recipient_acc),
        ];

        let err = process_close_state(&program_id, &accounts).unwrap_err();
        assert_eq!(err, ProgramError::from(OracleError::InvalidAuthority));
    }

    #[test]
    fn close_state_transfers_lamports_and_zero_fills() {
        let program_id = Pubkey::new_unique();
        let (state_key, bump) = derive_state_pda(&program_id);
        let authority = Pubkey::new_unique();
        let recipient_key = Pubkey::new_unique();

        let mut data = vec![0u8; state_size(NUM_ASSETS)];
        {
            let mut view = StateViewMut::new(&mut data, NUM_ASSETS).unwrap();
            view.set_tag(state_tag());
            view.set_update_authority(authority.to_bytes());
            view.set_decimals(8);
            view.set_bump(bump);
            view.set_slot(0, 0, 42, 100).unwrap();
        }

        let mut state_acc = TestAccount { lamports: 5_000, data, owner: program_id };
        let mut authority_acc = TestAccount { lamports: 0, data: vec![], owner: program_id };
        let mut recipient_acc = TestAccount { lamports: 10, data: vec![], owner: program_id };
        let accounts = vec![
            account_info(&state_key, false, &mut state_acc),
            account_info(&authority, true, &mut authority_acc),
            account_info(&recipient_key, false, &mut recipient_acc),
        ];

        process_close_state(&program_id, &accounts).unwrap();
        assert_eq!(recipient_acc.lamports, 5_010);
        assert_eq!(state_acc.lamports, 0);
        assert!(state_acc.data.iter().all(|b| *b == 0));
    }
}
