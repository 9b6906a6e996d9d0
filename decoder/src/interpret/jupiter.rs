//! Jupiter aggregator (v4 and v6 share the Anchor discriminators below).

use solana_sdk::instruction::Instruction;

use super::{Arg, ProgramInstruction};

const ROUTE_DISCRIMINATOR: [u8; 8] = [0xe5, 0x17, 0xcb, 0x97, 0x7a, 0xe3, 0xad, 0x2a];
const SHARED_ACCOUNTS_ROUTE_DISCRIMINATOR: [u8; 8] =
    [0xc1, 0x20, 0x9b, 0x33, 0x41, 0xd6, 0x9c, 0x81];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JupiterInstruction {
    Route { data: Vec<u8> },
    SharedAccountsRoute { data: Vec<u8> },
    Unknown { data: Vec<u8> },
}

impl JupiterInstruction {
    pub fn decode(ix: &Instruction) -> Self {
        let data = ix.data.clone();
        match ix.data.get(..8) {
            Some(d) if d == ROUTE_DISCRIMINATOR => Self::Route { data },
            Some(d) if d == SHARED_ACCOUNTS_ROUTE_DISCRIMINATOR => {
                Self::SharedAccountsRoute { data }
            }
            _ => Self::Unknown { data },
        }
    }
}

impl ProgramInstruction for JupiterInstruction {
    fn method(&self) -> String {
        match self {
            Self::Route { .. } => "route",
            Self::SharedAccountsRoute { .. } => "sharedAccountsRoute",
            Self::Unknown { .. } => "unknown",
        }
        .to_string()
    }

    fn args(&self) -> Vec<Arg> {
        match self {
            Self::Route { data } | Self::SharedAccountsRoute { data } | Self::Unknown { data } => {
                vec![Arg::ix_data(data)]
            }
        }
    }
}
