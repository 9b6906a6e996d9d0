//! Program-name registry
//!
//! Maps well-known program ids to display names per cluster. Unknown ids fall
//! back to a shortened address; lookups never fail.

use std::{fmt, str::FromStr};

use serde::Serialize;
use solana_sdk::{pubkey, pubkey::Pubkey};

// ============================================================================
// Known Program IDs
// ============================================================================

pub const SYSTEM_PROGRAM_ID: Pubkey = pubkey!("11111111111111111111111111111111");
pub const COMPUTE_BUDGET_PROGRAM_ID: Pubkey =
    pubkey!("ComputeBudget111111111111111111111111111111");
pub const TOKEN_PROGRAM_ID: Pubkey = pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");
pub const TOKEN_2022_PROGRAM_ID: Pubkey = pubkey!("TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb");
pub const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey =
    pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");
pub const MEMO_PROGRAM_ID: Pubkey = pubkey!("MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr");
pub const MEMO_PROGRAM_V1_ID: Pubkey = pubkey!("Memo1UhkJRfHyvLMcVucJwxXeuD728EqVDDwQDxFMNo");
pub const SERUM_DEX_V3_PROGRAM_ID: Pubkey =
    pubkey!("9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin");
pub const JUPITER_V4_PROGRAM_ID: Pubkey = pubkey!("JUP4Fb2cqiRUcaTHdrPC8h2gNsA2ETXiPDD33WcGuJB");
pub const JUPITER_V6_PROGRAM_ID: Pubkey = pubkey!("JUP6LkbZbjS1jKKwapdHNy74zcZ3tLUZoi5QNyVTaV4");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cluster {
    #[default]
    MainnetBeta,
    Testnet,
    Devnet,
    Custom,
}

impl Cluster {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cluster::MainnetBeta => "mainnet-beta",
            Cluster::Testnet => "testnet",
            Cluster::Devnet => "devnet",
            Cluster::Custom => "custom",
        }
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cluster {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet-beta" | "mainnet" => Ok(Cluster::MainnetBeta),
            "testnet" => Ok(Cluster::Testnet),
            "devnet" => Ok(Cluster::Devnet),
            "custom" | "localnet" => Ok(Cluster::Custom),
            other => Err(format!("unknown cluster: {other}")),
        }
    }
}

/// Where a registered program is deployed.
#[derive(Debug, Clone, Copy)]
enum Deployment {
    /// Native and SPL programs, present on every cluster.
    All,
    MainnetOnly,
}

const KNOWN_PROGRAMS: &[(Pubkey, &str, Deployment)] = &[
    (SYSTEM_PROGRAM_ID, "System Program", Deployment::All),
    (COMPUTE_BUDGET_PROGRAM_ID, "Compute Budget Program", Deployment::All),
    (pubkey!("Vote111111111111111111111111111111111111111"), "Vote Program", Deployment::All),
    (pubkey!("Stake11111111111111111111111111111111111111"), "Stake Program", Deployment::All),
    (pubkey!("Config1111111111111111111111111111111111111"), "Config Program", Deployment::All),
    (
        pubkey!("AddressLookupTab1e1111111111111111111111111"),
        "Address Lookup Table Program",
        Deployment::All,
    ),
    (
        pubkey!("BPFLoaderUpgradeab1e11111111111111111111111"),
        "BPF Upgradeable Loader",
        Deployment::All,
    ),
    (pubkey!("BPFLoader2111111111111111111111111111111111"), "BPF Loader 2", Deployment::All),
    (TOKEN_PROGRAM_ID, "Token Program", Deployment::All),
    (TOKEN_2022_PROGRAM_ID, "Token-2022 Program", Deployment::All),
    (ASSOCIATED_TOKEN_PROGRAM_ID, "Associated Token Program", Deployment::All),
    (MEMO_PROGRAM_ID, "Memo Program", Deployment::All),
    (MEMO_PROGRAM_V1_ID, "Memo Program v1", Deployment::All),
    (
        pubkey!("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s"),
        "Token Metadata Program",
        Deployment::All,
    ),
    (SERUM_DEX_V3_PROGRAM_ID, "Serum Dex Program v3", Deployment::MainnetOnly),
    (JUPITER_V4_PROGRAM_ID, "Jupiter Aggregator v4", Deployment::MainnetOnly),
    (JUPITER_V6_PROGRAM_ID, "Jupiter Aggregator v6", Deployment::MainnetOnly),
    (
        pubkey!("675kPX9MHTjS2zt1qfr1NYHuzeLXfQM9H24wFSUt1Mp8"),
        "Raydium AMM Program v4",
        Deployment::MainnetOnly,
    ),
    (
        pubkey!("whirLbMiicVdio4qvUfM5KAg6Ct8VwpYzGff3uctyCc"),
        "Orca Whirlpools Program",
        Deployment::MainnetOnly,
    ),
    (
        pubkey!("MERLuDFBMmsHnsBPZw2sDQZHvXFMwp8EdjudcU2HKky"),
        "Mercurial Stable Swap Program",
        Deployment::MainnetOnly,
    ),
];

/// Display name of a registered program, if it is deployed on `cluster`.
pub fn known_program_name(program_id: &Pubkey, cluster: Cluster) -> Option<&'static str> {
    KNOWN_PROGRAMS
        .iter()
        .find(|(id, _, _)| id == program_id)
        .and_then(|(_, name, deployment)| match deployment {
            Deployment::All => Some(*name),
            Deployment::MainnetOnly if cluster == Cluster::MainnetBeta => Some(*name),
            Deployment::MainnetOnly => None,
        })
}

/// Display name of a program, or its shortened address.
pub fn program_name(program_id: &Pubkey, cluster: Cluster) -> String {
    known_program_name(program_id, cluster)
        .map(str::to_string)
        .unwrap_or_else(|| shorten_address(&program_id.to_string(), 4))
}

/// Keep `chars` characters at each end of an address.
pub fn shorten_address(address: &str, chars: usize) -> String {
    let len = address.chars().count();
    if len <= chars * 2 {
        return address.to_string();
    }
    let head: String = address.chars().take(chars).collect();
    let tail: String = address.chars().skip(len - chars).collect();
    format!("{head}...{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_program_names() {
        assert_eq!(program_name(&TOKEN_PROGRAM_ID, Cluster::MainnetBeta), "Token Program");
        assert_eq!(program_name(&SYSTEM_PROGRAM_ID, Cluster::Devnet), "System Program");
        assert_eq!(
            program_name(&JUPITER_V4_PROGRAM_ID, Cluster::MainnetBeta),
            "Jupiter Aggregator v4"
        );
    }

    #[test]
    fn test_mainnet_only_programs_fall_back_elsewhere() {
        assert_eq!(program_name(&SERUM_DEX_V3_PROGRAM_ID, Cluster::Devnet), "9xQe...VFin");
        assert!(known_program_name(&JUPITER_V6_PROGRAM_ID, Cluster::Testnet).is_none());
    }

    #[test]
    fn test_unknown_program_is_shortened() {
        let id = pubkey!("8jaLKWLJAj5jVCZbxpe3zRUvLB3LD48MRtaQ2AjfCfxa");
        assert_eq!(program_name(&id, Cluster::MainnetBeta), "8jaL...Cfxa");
    }

    #[test]
    fn test_cluster_from_str() {
        assert_eq!("mainnet-beta".parse::<Cluster>(), Ok(Cluster::MainnetBeta));
        assert_eq!("Devnet".parse::<Cluster>(), Ok(Cluster::Devnet));
        assert!("moon".parse::<Cluster>().is_err());
    }

    #[test]
    fn test_shorten_short_address_is_unchanged() {
        assert_eq!(shorten_address("abc", 4), "abc");
    }

    #[test]
    fn test_shorten_counts_characters_not_bytes() {
        let address = "a\u{e9}\u{e9}\u{e9}\u{e9}\u{e9}\u{e9}\u{e9}\u{e9}z";
        assert_eq!(
            shorten_address(address, 4),
            "a\u{e9}\u{e9}\u{e9}...\u{e9}\u{e9}\u{e9}z"
        );
    }
}
