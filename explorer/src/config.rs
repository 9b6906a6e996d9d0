//! Configuration for the explorer binary

use clap::{Parser, ValueEnum};
use ixtree::Cluster;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Reconstruct and print the call tree of Solana transactions
#[derive(Parser, Debug, Clone)]
#[command(name = "ixtree-explorer")]
#[command(about = "Print the nested instruction tree of Solana transactions", long_about = None)]
pub struct Config {
    /// RPC URL
    #[arg(long, env = "RPC_URL", default_value = "https://api.mainnet-beta.solana.com")]
    pub rpc_url: String,

    /// Cluster used for program names (mainnet-beta, testnet, devnet, custom)
    #[arg(long, env = "CLUSTER", default_value = "mainnet-beta")]
    pub cluster: Cluster,

    /// Commitment level for getTransaction
    #[arg(long, env = "COMMITMENT", default_value = "confirmed")]
    pub commitment: String,

    /// Retries after a failed RPC call
    #[arg(long, env = "MAX_RETRIES", default_value = "3")]
    pub max_retries: u32,

    /// Delay between retries in milliseconds
    #[arg(long, env = "RETRY_DELAY_MS", default_value = "500")]
    pub retry_delay_ms: u64,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Read signatures from stdin, one per line; a new line supersedes the
    /// lookup still in flight
    #[arg(long)]
    pub watch: bool,

    /// List the most recent transactions of this account instead of
    /// analyzing signatures
    #[arg(long, conflicts_with = "watch")]
    pub account: Option<String>,

    /// Transaction signatures to analyze
    #[arg(required_unless_present_any = ["watch", "account"])]
    pub signatures: Vec<String>,
}
