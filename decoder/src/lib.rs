//! Solana transaction call-tree reconstruction.
//!
//! Rebuilds the nested instruction tree of a transaction from its compiled
//! instructions, the flat inner-instruction lists and the program logs, then
//! describes each node and pulls out the token transfers.

pub mod amount;
pub mod analyzer;
pub mod error;
pub mod interpret;
pub mod logs;
pub mod programs;
pub mod resolver;
pub mod snapshot;
pub mod transfers;
pub mod tree;

mod serialize;

pub use analyzer::{reconstruct, Reconstruction, TransactionAnalysis, TransactionAnalyzer};
pub use error::{ReconstructError, SnapshotError};
pub use programs::Cluster;
pub use snapshot::TransactionSnapshot;
