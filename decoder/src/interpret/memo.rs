//! SPL Memo (v1 and v2).

use solana_sdk::{instruction::Instruction, pubkey::Pubkey};

use super::{AccountOfInterest, Arg, ProgramInstruction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoInstruction {
    Memo { text: String, signers: Vec<Pubkey> },
    /// Memo bytes that are not valid UTF-8.
    Unknown { data: Vec<u8> },
}

impl MemoInstruction {
    pub fn decode(ix: &Instruction) -> Self {
        match std::str::from_utf8(&ix.data) {
            Ok(text) => Self::Memo {
                text: text.to_string(),
                signers: ix
                    .accounts
                    .iter()
                    .filter(|meta| meta.is_signer)
                    .map(|meta| meta.pubkey)
                    .collect(),
            },
            Err(_) => Self::Unknown {
                data: ix.data.clone(),
            },
        }
    }
}

impl ProgramInstruction for MemoInstruction {
    fn method(&self) -> String {
        match self {
            Self::Memo { .. } => "memo".to_string(),
            Self::Unknown { .. } => "unknown".to_string(),
        }
    }

    fn args(&self) -> Vec<Arg> {
        match self {
            Self::Memo { text, .. } => vec![Arg::new("text", text)],
            Self::Unknown { data } => vec![Arg::new("unknown", hex::encode(data))],
        }
    }

    fn accounts_of_interest(&self) -> Vec<AccountOfInterest> {
        match self {
            Self::Memo { signers, .. } => signers
                .iter()
                .map(|signer| AccountOfInterest::new("signer", *signer))
                .collect(),
            Self::Unknown { .. } => Vec::new(),
        }
    }
}
