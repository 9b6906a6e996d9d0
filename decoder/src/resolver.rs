//! Compiled instruction resolution
//!
//! Expands the index-based account references of a compiled instruction into
//! concrete `AccountMeta`s. Signer and writable flags come from the message
//! header, which splits the static keys into four contiguous zones:
//!
//! ```text
//! [writable signer][readonly signer][writable non-signer][readonly non-signer]
//! ```
//!
//! Keys loaded from lookup tables are never signers; the writable ones come
//! first.

use solana_sdk::{
    instruction::{AccountMeta, CompiledInstruction, Instruction},
    message::MessageHeader,
};

use crate::{
    error::{IndexKind, ReconstructError},
    snapshot::AccountKeyTable,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountPermissions {
    pub is_signer: bool,
    pub is_writable: bool,
}

/// Signer/writable flags of the key at `index` in the logical key table.
pub fn account_permissions(
    index: usize,
    header: &MessageHeader,
    keys: &AccountKeyTable,
) -> AccountPermissions {
    let num_signers = header.num_required_signatures as usize;
    let static_len = keys.static_len();

    let is_signer = index < num_signers;
    let is_writable = if is_signer {
        let num_writable_signed =
            num_signers.saturating_sub(header.num_readonly_signed_accounts as usize);
        index < num_writable_signed
    } else if index < static_len {
        let writable_end =
            static_len.saturating_sub(header.num_readonly_unsigned_accounts as usize);
        index < writable_end
    } else {
        index - static_len < keys.lookup_writable_len()
    };

    AccountPermissions {
        is_signer,
        is_writable,
    }
}

/// Resolve a compiled instruction against the message it belongs to.
///
/// The program id goes through the same lookup as the accounts but carries no
/// flags of its own.
pub fn resolve_instruction(
    compiled: &CompiledInstruction,
    header: &MessageHeader,
    keys: &AccountKeyTable,
) -> Result<Instruction, ReconstructError> {
    let mut accounts = Vec::with_capacity(compiled.accounts.len());
    for &key_index in &compiled.accounts {
        let pubkey = keys
            .get(key_index as usize)
            .ok_or(ReconstructError::UnresolvedAccount {
                index: key_index,
                kind: IndexKind::Account,
            })?;
        let permissions = account_permissions(key_index as usize, header, keys);
        accounts.push(AccountMeta {
            pubkey: *pubkey,
            is_signer: permissions.is_signer,
            is_writable: permissions.is_writable,
        });
    }

    let program_id = keys
        .get(compiled.program_id_index as usize)
        .ok_or(ReconstructError::UnresolvedAccount {
            index: compiled.program_id_index,
            kind: IndexKind::ProgramId,
        })?;

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data: compiled.data.clone(),
    })
}
