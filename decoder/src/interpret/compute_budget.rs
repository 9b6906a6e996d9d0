//! Compute Budget program.

use solana_sdk::instruction::Instruction;

use super::{Arg, ProgramInstruction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComputeBudgetInstruction {
    RequestHeapFrame { bytes: u32 },
    SetComputeUnitLimit { units: u32 },
    SetComputeUnitPrice { micro_lamports: u64 },
    Unknown { data: Vec<u8> },
}

impl ComputeBudgetInstruction {
    pub fn decode(ix: &Instruction) -> Self {
        let data = ix.data.as_slice();
        let u32_at = |offset: usize| {
            data.get(offset..offset + 4)
                .and_then(|bytes| bytes.try_into().ok())
                .map(u32::from_le_bytes)
        };
        let u64_at = |offset: usize| {
            data.get(offset..offset + 8)
                .and_then(|bytes| bytes.try_into().ok())
                .map(u64::from_le_bytes)
        };

        let decoded = match data.first() {
            Some(1) => u32_at(1).map(|bytes| Self::RequestHeapFrame { bytes }),
            Some(2) => u32_at(1).map(|units| Self::SetComputeUnitLimit { units }),
            Some(3) => u64_at(1).map(|micro_lamports| Self::SetComputeUnitPrice { micro_lamports }),
            _ => None,
        };
        decoded.unwrap_or_else(|| Self::Unknown {
            data: ix.data.clone(),
        })
    }
}

impl ProgramInstruction for ComputeBudgetInstruction {
    fn method(&self) -> String {
        match self {
            Self::RequestHeapFrame { .. } => "requestHeapFrame",
            Self::SetComputeUnitLimit { .. } => "setComputeUnitLimit",
            Self::SetComputeUnitPrice { .. } => "setComputeUnitPrice",
            Self::Unknown { .. } => "unknown",
        }
        .to_string()
    }

    fn args(&self) -> Vec<Arg> {
        match self {
            Self::RequestHeapFrame { bytes } => vec![Arg::new("bytes", bytes)],
            Self::SetComputeUnitLimit { units } => vec![Arg::new("units", units)],
            Self::SetComputeUnitPrice { micro_lamports } => {
                vec![Arg::new("microLamports", micro_lamports)]
            }
            Self::Unknown { data } => vec![Arg::new("unknown", hex::encode(data))],
        }
    }
}
