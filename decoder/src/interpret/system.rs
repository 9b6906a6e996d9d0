//! System program.
//!
//! Instruction data is the bincode encoding of the program's instruction
//! enum: a little-endian `u32` variant index followed by the fields.

use serde::Deserialize;
use solana_sdk::{instruction::Instruction, pubkey::Pubkey};

use super::{account_at, AccountOfInterest, Arg, ProgramInstruction};
use crate::amount::format_ui_amount_u64;

const SOL_DECIMALS: u8 = 9;

/// Wire layout of the leading system instruction variants.
#[allow(dead_code)]
#[derive(Debug, Deserialize)]
enum SystemWire {
    CreateAccount {
        lamports: u64,
        space: u64,
        owner: [u8; 32],
    },
    Assign {
        owner: [u8; 32],
    },
    Transfer {
        lamports: u64,
    },
    CreateAccountWithSeed {
        base: [u8; 32],
        seed: String,
        lamports: u64,
        space: u64,
        owner: [u8; 32],
    },
    AdvanceNonceAccount,
    WithdrawNonceAccount(u64),
    InitializeNonceAccount([u8; 32]),
    AuthorizeNonceAccount([u8; 32]),
    Allocate {
        space: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemProgramInstruction {
    Transfer {
        from: Pubkey,
        to: Pubkey,
        lamports: u64,
    },
    CreateAccount {
        from: Pubkey,
        new_account: Pubkey,
        lamports: u64,
        space: u64,
        owner: Pubkey,
    },
    Assign {
        account: Pubkey,
        owner: Pubkey,
    },
    Allocate {
        account: Pubkey,
        space: u64,
    },
    AdvanceNonceAccount {
        nonce_account: Pubkey,
        nonce_authority: Pubkey,
    },
    Unknown {
        discriminator: Option<u32>,
        data: Vec<u8>,
    },
}

impl SystemProgramInstruction {
    pub fn decode(ix: &Instruction) -> Self {
        Self::try_decode(ix).unwrap_or_else(|| Self::Unknown {
            discriminator: ix
                .data
                .get(..4)
                .and_then(|tag| tag.try_into().ok())
                .map(u32::from_le_bytes),
            data: ix.data.clone(),
        })
    }

    fn try_decode(ix: &Instruction) -> Option<Self> {
        let wire: SystemWire = bincode::deserialize(&ix.data).ok()?;
        let account = |position| account_at(ix, position);
        let decoded = match wire {
            SystemWire::Transfer { lamports } => Self::Transfer {
                from: account(0)?,
                to: account(1)?,
                lamports,
            },
            SystemWire::CreateAccount {
                lamports,
                space,
                owner,
            } => Self::CreateAccount {
                from: account(0)?,
                new_account: account(1)?,
                lamports,
                space,
                owner: Pubkey::new_from_array(owner),
            },
            SystemWire::Assign { owner } => Self::Assign {
                account: account(0)?,
                owner: Pubkey::new_from_array(owner),
            },
            SystemWire::Allocate { space } => Self::Allocate {
                account: account(0)?,
                space,
            },
            // [nonce_account, recent_blockhashes_sysvar, nonce_authority]
            SystemWire::AdvanceNonceAccount => Self::AdvanceNonceAccount {
                nonce_account: account(0)?,
                nonce_authority: account(2)?,
            },
            SystemWire::CreateAccountWithSeed { .. }
            | SystemWire::WithdrawNonceAccount(_)
            | SystemWire::InitializeNonceAccount(_)
            | SystemWire::AuthorizeNonceAccount(_) => return None,
        };
        Some(decoded)
    }
}

impl ProgramInstruction for SystemProgramInstruction {
    fn method(&self) -> String {
        match self {
            Self::Transfer { .. } => "transfer".to_string(),
            Self::CreateAccount { .. } => "createAccount".to_string(),
            Self::Assign { .. } => "assign".to_string(),
            Self::Allocate { .. } => "allocate".to_string(),
            Self::AdvanceNonceAccount { .. } => "advanceNonceAccount".to_string(),
            Self::Unknown {
                discriminator: Some(tag),
                ..
            } => tag.to_string(),
            Self::Unknown { .. } => "unknown".to_string(),
        }
    }

    fn args(&self) -> Vec<Arg> {
        match self {
            Self::Transfer { lamports, .. } => vec![
                Arg::new("lamports", lamports),
                Arg::new("sol", format_ui_amount_u64(*lamports, SOL_DECIMALS)),
            ],
            Self::CreateAccount {
                lamports,
                space,
                owner,
                ..
            } => vec![
                Arg::new("lamports", lamports),
                Arg::new("sol", format_ui_amount_u64(*lamports, SOL_DECIMALS)),
                Arg::new("space", space),
                Arg::new("owner", owner),
            ],
            Self::Assign { owner, .. } => vec![Arg::new("owner", owner)],
            Self::Allocate { space, .. } => vec![Arg::new("space", space)],
            Self::AdvanceNonceAccount { .. } => Vec::new(),
            Self::Unknown { data, .. } => vec![Arg::new("unknown", hex::encode(data))],
        }
    }

    fn accounts_of_interest(&self) -> Vec<AccountOfInterest> {
        match self {
            Self::Transfer { from, to, .. } => vec![
                AccountOfInterest::new("from", *from),
                AccountOfInterest::new("to", *to),
            ],
            Self::CreateAccount {
                from, new_account, ..
            } => vec![
                AccountOfInterest::new("from", *from),
                AccountOfInterest::new("newAccount", *new_account),
            ],
            Self::Assign { account, .. } | Self::Allocate { account, .. } => {
                vec![AccountOfInterest::new("account", *account)]
            }
            Self::AdvanceNonceAccount {
                nonce_account,
                nonce_authority,
            } => vec![
                AccountOfInterest::new("nonceAccount", *nonce_account),
                AccountOfInterest::new("nonceAuthority", *nonce_authority),
            ],
            Self::Unknown { .. } => Vec::new(),
        }
    }
}
