//! Serum DEX v3.
//!
//! Instructions start with a version byte (always 0) followed by a
//! little-endian `u32` tag; the first two bytes are enough to tell the
//! supported variants apart.

use num_enum::TryFromPrimitive;
use solana_sdk::instruction::Instruction;

use super::{Arg, ProgramInstruction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum SerumMethod {
    ConsumeEvents = 3,
    SettleFunds = 5,
    NewOrderV3 = 10,
    CancelOrderV2 = 11,
    CancelOrderByClientIdV2 = 12,
}

impl SerumMethod {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ConsumeEvents => "consumeEvents",
            Self::SettleFunds => "settleFunds",
            Self::NewOrderV3 => "newOrderV3",
            Self::CancelOrderV2 => "cancelOrderV2",
            Self::CancelOrderByClientIdV2 => "cancelOrderByClientIdV2",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerumInstruction {
    Known { method: SerumMethod, data: Vec<u8> },
    Unknown { data: Vec<u8> },
}

impl SerumInstruction {
    pub fn decode(ix: &Instruction) -> Self {
        let method = match ix.data.as_slice() {
            [0, tag, ..] => SerumMethod::try_from(*tag).ok(),
            _ => None,
        };
        match method {
            Some(method) => Self::Known {
                method,
                data: ix.data.clone(),
            },
            None => Self::Unknown {
                data: ix.data.clone(),
            },
        }
    }
}

impl ProgramInstruction for SerumInstruction {
    fn method(&self) -> String {
        match self {
            Self::Known { method, .. } => method.name().to_string(),
            Self::Unknown { .. } => "unknown".to_string(),
        }
    }

    fn args(&self) -> Vec<Arg> {
        match self {
            Self::Known { data, .. } | Self::Unknown { data } => vec![Arg::ix_data(data)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::programs::SERUM_DEX_V3_PROGRAM_ID;

    fn serum_ix(data: Vec<u8>) -> Instruction {
        Instruction::new_with_bytes(SERUM_DEX_V3_PROGRAM_ID, &data, vec![])
    }

    #[test]
    fn test_two_byte_discriminator() {
        let decoded = SerumInstruction::decode(&serum_ix(vec![0, 10, 0, 0, 0, 1]));
        assert_eq!(decoded.method(), "newOrderV3");
        assert_eq!(decoded.args(), vec![Arg::new("ixData", "0x000a00000001")]);
        assert!(decoded.accounts_of_interest().is_empty());

        let settle = SerumInstruction::decode(&serum_ix(vec![0, 5, 0, 0, 0]));
        assert_eq!(settle.method(), "settleFunds");
    }

    #[test]
    fn test_short_or_unknown_data() {
        assert_eq!(SerumInstruction::decode(&serum_ix(vec![0])).method(), "unknown");
        assert_eq!(SerumInstruction::decode(&serum_ix(vec![1, 10])).method(), "unknown");
        assert_eq!(SerumInstruction::decode(&serum_ix(vec![0, 99])).method(), "unknown");
    }
}
