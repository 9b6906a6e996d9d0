//! SPL Token (and the shared Token-2022 base layout).

use solana_sdk::{instruction::Instruction, pubkey::Pubkey};
use spl_token::instruction::TokenInstruction;

use super::{account_at, AccountOfInterest, Arg, ProgramInstruction};
use crate::amount::format_ui_amount_u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenProgramInstruction {
    Transfer {
        amount: u64,
        source: Pubkey,
        destination: Pubkey,
        owner: Pubkey,
    },
    TransferChecked {
        amount: u64,
        decimals: u8,
        source: Pubkey,
        mint: Pubkey,
        destination: Pubkey,
        owner: Pubkey,
    },
    MintTo {
        amount: u64,
        mint: Pubkey,
        destination: Pubkey,
        authority: Pubkey,
    },
    Burn {
        amount: u64,
        account: Pubkey,
        mint: Pubkey,
        owner: Pubkey,
    },
    /// Any other tag, or a known tag whose data or accounts are short.
    Unknown {
        discriminator: Option<u8>,
        data: Vec<u8>,
    },
}

impl TokenProgramInstruction {
    pub fn decode(ix: &Instruction) -> Self {
        Self::try_decode(ix).unwrap_or_else(|| Self::Unknown {
            discriminator: ix.data.first().copied(),
            data: ix.data.clone(),
        })
    }

    fn try_decode(ix: &Instruction) -> Option<Self> {
        let account = |position| account_at(ix, position);
        let decoded = match TokenInstruction::unpack(&ix.data).ok()? {
            TokenInstruction::Transfer { amount } => Self::Transfer {
                amount,
                source: account(0)?,
                destination: account(1)?,
                owner: account(2)?,
            },
            TokenInstruction::TransferChecked { amount, decimals } => Self::TransferChecked {
                amount,
                decimals,
                source: account(0)?,
                mint: account(1)?,
                destination: account(2)?,
                owner: account(3)?,
            },
            TokenInstruction::MintTo { amount } => Self::MintTo {
                amount,
                mint: account(0)?,
                destination: account(1)?,
                authority: account(2)?,
            },
            TokenInstruction::Burn { amount } => Self::Burn {
                amount,
                account: account(0)?,
                mint: account(1)?,
                owner: account(2)?,
            },
            _ => return None,
        };
        Some(decoded)
    }

    /// Raw amount and destination token account of a transfer-shaped
    /// instruction.
    pub fn as_transfer(&self) -> Option<TokenTransfer> {
        match *self {
            Self::Transfer {
                amount,
                source,
                destination,
                owner,
            } => Some(TokenTransfer {
                amount,
                source,
                destination,
                owner,
                decimals: None,
            }),
            Self::TransferChecked {
                amount,
                decimals,
                source,
                destination,
                owner,
                ..
            } => Some(TokenTransfer {
                amount,
                source,
                destination,
                owner,
                decimals: Some(decimals),
            }),
            _ => None,
        }
    }
}

/// Common fields of `transfer` and `transferChecked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenTransfer {
    pub amount: u64,
    pub source: Pubkey,
    pub destination: Pubkey,
    pub owner: Pubkey,
    pub decimals: Option<u8>,
}

impl ProgramInstruction for TokenProgramInstruction {
    fn method(&self) -> String {
        match self {
            Self::Transfer { .. } => "transfer".to_string(),
            Self::TransferChecked { .. } => "transferChecked".to_string(),
            Self::MintTo { .. } => "mintTo".to_string(),
            Self::Burn { .. } => "burn".to_string(),
            Self::Unknown {
                discriminator: Some(tag),
                ..
            } => tag.to_string(),
            Self::Unknown {
                discriminator: None,
                ..
            } => "unknown".to_string(),
        }
    }

    fn args(&self) -> Vec<Arg> {
        match self {
            Self::Transfer { amount, .. }
            | Self::MintTo { amount, .. }
            | Self::Burn { amount, .. } => vec![Arg::new("amount", amount)],
            Self::TransferChecked {
                amount, decimals, ..
            } => vec![
                Arg::new("amount", format_ui_amount_u64(*amount, *decimals)),
                Arg::new("decimals", decimals),
            ],
            Self::Unknown { data, .. } => vec![Arg::new("unknown", hex::encode(data))],
        }
    }

    fn accounts_of_interest(&self) -> Vec<AccountOfInterest> {
        match self {
            Self::Transfer {
                source,
                destination,
                owner,
                ..
            } => vec![
                AccountOfInterest::new("owner", *owner),
                AccountOfInterest::new("source", *source),
                AccountOfInterest::new("destination", *destination),
            ],
            Self::TransferChecked {
                source,
                mint,
                destination,
                owner,
                ..
            } => vec![
                AccountOfInterest::new("owner", *owner),
                AccountOfInterest::new("source", *source),
                AccountOfInterest::new("destination", *destination),
                AccountOfInterest::new("mint", *mint),
            ],
            Self::MintTo {
                mint,
                destination,
                authority,
                ..
            } => vec![
                AccountOfInterest::new("authority", *authority),
                AccountOfInterest::new("destination", *destination),
                AccountOfInterest::new("mint", *mint),
            ],
            Self::Burn {
                account,
                mint,
                owner,
                ..
            } => vec![
                AccountOfInterest::new("account", *account),
                AccountOfInterest::new("mint", *mint),
                AccountOfInterest::new("owner", *owner),
            ],
            Self::Unknown { .. } => Vec::new(),
        }
    }
}
