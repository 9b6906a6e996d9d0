//! High-level instruction interpretation
//!
//! Each supported program owns a closed enum of the instructions it knows how
//! to describe plus an `Unknown` arm for everything else. Dispatch is a static
//! match on the program id; anything outside the allow-list is left to the
//! caller to render raw.
//!
//! Decoders never fail. Short or malformed data for a supported program lands
//! in that program's `Unknown` arm.

mod associated_token;
mod compute_budget;
mod jupiter;
mod memo;
mod serum;
mod system;
mod token;

pub use associated_token::{AssociatedTokenInstruction, CreateAccounts};
pub use compute_budget::ComputeBudgetInstruction;
pub use jupiter::JupiterInstruction;
pub use memo::MemoInstruction;
pub use serum::{SerumInstruction, SerumMethod};
pub use system::SystemProgramInstruction;
pub use token::{TokenProgramInstruction, TokenTransfer};

use serde::Serialize;
use solana_sdk::{instruction::Instruction, pubkey::Pubkey};

use crate::programs::{
    program_name, Cluster, ASSOCIATED_TOKEN_PROGRAM_ID, COMPUTE_BUDGET_PROGRAM_ID,
    JUPITER_V4_PROGRAM_ID, JUPITER_V6_PROGRAM_ID, MEMO_PROGRAM_ID, MEMO_PROGRAM_V1_ID,
    SERUM_DEX_V3_PROGRAM_ID, SYSTEM_PROGRAM_ID, TOKEN_2022_PROGRAM_ID, TOKEN_PROGRAM_ID,
};

// ============================================================================
// Summary Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Arg {
    pub name: String,
    pub value: String,
}

impl Arg {
    pub fn new(name: &str, value: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    /// `0x`-prefixed hex of the full instruction data.
    pub fn ix_data(data: &[u8]) -> Self {
        Self::new("ixData", format!("0x{}", hex::encode(data)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountOfInterest {
    pub role: String,
    #[serde(serialize_with = "crate::serialize::display")]
    pub account: Pubkey,
}

impl AccountOfInterest {
    pub fn new(role: &str, account: Pubkey) -> Self {
        Self {
            role: role.to_string(),
            account,
        }
    }
}

/// What an instruction does, reduced to what a reader needs to follow it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HighLevelSummary {
    pub program: String,
    pub method: String,
    pub args: Vec<Arg>,
    pub accounts_of_interest: Vec<AccountOfInterest>,
}

/// Shared shape of every per-program instruction enum.
pub trait ProgramInstruction {
    fn method(&self) -> String;

    fn args(&self) -> Vec<Arg> {
        Vec::new()
    }

    fn accounts_of_interest(&self) -> Vec<AccountOfInterest> {
        Vec::new()
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Programs with a decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownProgram {
    Token,
    Token2022,
    AssociatedToken,
    SerumDexV3,
    JupiterV4,
    JupiterV6,
    System,
    ComputeBudget,
    Memo,
}

impl KnownProgram {
    pub fn from_program_id(program_id: &Pubkey) -> Option<Self> {
        match *program_id {
            id if id == TOKEN_PROGRAM_ID => Some(Self::Token),
            id if id == TOKEN_2022_PROGRAM_ID => Some(Self::Token2022),
            id if id == ASSOCIATED_TOKEN_PROGRAM_ID => Some(Self::AssociatedToken),
            id if id == SERUM_DEX_V3_PROGRAM_ID => Some(Self::SerumDexV3),
            id if id == JUPITER_V4_PROGRAM_ID => Some(Self::JupiterV4),
            id if id == JUPITER_V6_PROGRAM_ID => Some(Self::JupiterV6),
            id if id == SYSTEM_PROGRAM_ID => Some(Self::System),
            id if id == COMPUTE_BUDGET_PROGRAM_ID => Some(Self::ComputeBudget),
            id if id == MEMO_PROGRAM_ID || id == MEMO_PROGRAM_V1_ID => Some(Self::Memo),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedInstruction {
    Token(TokenProgramInstruction),
    AssociatedToken(AssociatedTokenInstruction),
    Serum(SerumInstruction),
    Jupiter(JupiterInstruction),
    System(SystemProgramInstruction),
    ComputeBudget(ComputeBudgetInstruction),
    Memo(MemoInstruction),
}

impl DecodedInstruction {
    /// Decode `ix` if its program is on the allow-list.
    pub fn decode(ix: &Instruction) -> Option<Self> {
        let decoded = match KnownProgram::from_program_id(&ix.program_id)? {
            KnownProgram::Token | KnownProgram::Token2022 => {
                Self::Token(TokenProgramInstruction::decode(ix))
            }
            KnownProgram::AssociatedToken => {
                Self::AssociatedToken(AssociatedTokenInstruction::decode(ix))
            }
            KnownProgram::SerumDexV3 => Self::Serum(SerumInstruction::decode(ix)),
            KnownProgram::JupiterV4 | KnownProgram::JupiterV6 => {
                Self::Jupiter(JupiterInstruction::decode(ix))
            }
            KnownProgram::System => Self::System(SystemProgramInstruction::decode(ix)),
            KnownProgram::ComputeBudget => {
                Self::ComputeBudget(ComputeBudgetInstruction::decode(ix))
            }
            KnownProgram::Memo => Self::Memo(MemoInstruction::decode(ix)),
        };
        Some(decoded)
    }

    fn inner(&self) -> &dyn ProgramInstruction {
        match self {
            Self::Token(ix) => ix,
            Self::AssociatedToken(ix) => ix,
            Self::Serum(ix) => ix,
            Self::Jupiter(ix) => ix,
            Self::System(ix) => ix,
            Self::ComputeBudget(ix) => ix,
            Self::Memo(ix) => ix,
        }
    }
}

impl ProgramInstruction for DecodedInstruction {
    fn method(&self) -> String {
        self.inner().method()
    }

    fn args(&self) -> Vec<Arg> {
        self.inner().args()
    }

    fn accounts_of_interest(&self) -> Vec<AccountOfInterest> {
        self.inner().accounts_of_interest()
    }
}

/// Semantic summary of `ix`, or `None` when its program has no decoder.
pub fn interpret(ix: &Instruction, cluster: Cluster) -> Option<HighLevelSummary> {
    let decoded = DecodedInstruction::decode(ix)?;
    Some(HighLevelSummary {
        program: program_name(&ix.program_id, cluster),
        method: decoded.method(),
        args: decoded.args(),
        accounts_of_interest: decoded.accounts_of_interest(),
    })
}

/// How an instruction should be shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum InstructionView {
    HighLevel(HighLevelSummary),
    #[serde(rename_all = "camelCase")]
    Raw { program: String, data_hex: String },
}

pub fn describe(ix: &Instruction, cluster: Cluster) -> InstructionView {
    match interpret(ix, cluster) {
        Some(summary) => InstructionView::HighLevel(summary),
        None => InstructionView::Raw {
            program: program_name(&ix.program_id, cluster),
            data_hex: hex::encode(&ix.data),
        },
    }
}

/// Account at `position` in the instruction's account list.
pub(crate) fn account_at(ix: &Instruction, position: usize) -> Option<Pubkey> {
    ix.accounts.get(position).map(|meta| meta.pubkey)
}
