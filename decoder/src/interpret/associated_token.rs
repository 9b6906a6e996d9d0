//! Associated Token Account program.

use solana_sdk::{instruction::Instruction, pubkey::Pubkey};

use super::{account_at, AccountOfInterest, Arg, ProgramInstruction};

/// Accounts shared by `create` and `createIdempotent`:
/// `[payer, associated_token, wallet, mint, system_program, token_program]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateAccounts {
    pub payer: Pubkey,
    pub associated_token: Pubkey,
    pub owner: Pubkey,
    pub mint: Pubkey,
}

impl CreateAccounts {
    fn from_instruction(ix: &Instruction) -> Option<Self> {
        Some(Self {
            payer: account_at(ix, 0)?,
            associated_token: account_at(ix, 1)?,
            owner: account_at(ix, 2)?,
            mint: account_at(ix, 3)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssociatedTokenInstruction {
    Create(CreateAccounts),
    CreateIdempotent(CreateAccounts),
    // [nested_ata, nested_mint, destination_ata, owner_ata, owner_mint, wallet, ..]
    RecoverNested {
        nested_mint: Pubkey,
        destination: Pubkey,
        wallet: Pubkey,
    },
    Unknown {
        data: Vec<u8>,
    },
}

impl AssociatedTokenInstruction {
    pub fn decode(ix: &Instruction) -> Self {
        let decoded = match ix.data.as_slice() {
            [] => CreateAccounts::from_instruction(ix).map(Self::Create),
            [1] => CreateAccounts::from_instruction(ix).map(Self::CreateIdempotent),
            [2] => Self::recover_nested(ix),
            _ => None,
        };
        decoded.unwrap_or_else(|| Self::Unknown {
            data: ix.data.clone(),
        })
    }

    fn recover_nested(ix: &Instruction) -> Option<Self> {
        Some(Self::RecoverNested {
            nested_mint: account_at(ix, 1)?,
            destination: account_at(ix, 2)?,
            wallet: account_at(ix, 5)?,
        })
    }
}

impl ProgramInstruction for AssociatedTokenInstruction {
    fn method(&self) -> String {
        match self {
            Self::Create(_) => "create",
            Self::CreateIdempotent(_) => "createIdempotent",
            Self::RecoverNested { .. } => "recoverNested",
            Self::Unknown { .. } => "unknown",
        }
        .to_string()
    }

    fn args(&self) -> Vec<Arg> {
        match self {
            Self::Unknown { data } => vec![Arg::new("unknown", hex::encode(data))],
            _ => Vec::new(),
        }
    }

    fn accounts_of_interest(&self) -> Vec<AccountOfInterest> {
        match self {
            Self::Create(accounts) | Self::CreateIdempotent(accounts) => vec![
                AccountOfInterest::new("payer", accounts.payer),
                AccountOfInterest::new("owner", accounts.owner),
                AccountOfInterest::new("mint", accounts.mint),
            ],
            Self::RecoverNested {
                nested_mint,
                destination,
                wallet,
            } => vec![
                AccountOfInterest::new("owner", *wallet),
                AccountOfInterest::new("mint", *nested_mint),
                AccountOfInterest::new("destination", *destination),
            ],
            Self::Unknown { .. } => Vec::new(),
        }
    }
}
