use std::fmt;

use thiserror::Error;

/// Which slot of a compiled instruction an account index came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    ProgramId,
    Account,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::ProgramId => f.write_str("program id"),
            IndexKind::Account => f.write_str("account"),
        }
    }
}

/// Failures that invalidate the reconstruction of a whole transaction.
///
/// None of these are recovered locally: a transaction that hits one of them
/// is reported as a single failure instead of a partially correct tree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReconstructError {
    /// A compiled instruction references an index with no entry in the
    /// static + lookup key table.
    #[error("failed to find key for {kind} index {index}")]
    UnresolvedAccount { index: u8, kind: IndexKind },

    /// The log-derived stack heights ran out before the inner instructions
    /// did, so the two sequences are no longer aligned.
    #[error(
        "failed to match stack height for inner instruction {inner_index} of instruction {top_level_index}: \
         sequence exhausted after {consumed} entries"
    )]
    StackHeightExhausted {
        top_level_index: usize,
        inner_index: usize,
        consumed: usize,
    },

    /// An inner-instruction group points at a top-level instruction that
    /// does not exist.
    #[error("inner instructions reference instruction {index} but the message has {count}")]
    OrphanInnerInstructions { index: u8, count: usize },
}

/// Errors raised while turning a JSON-RPC `getTransaction` payload into a
/// [`crate::snapshot::TransactionSnapshot`].
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid pubkey {value}: {reason}")]
    InvalidPubkey { value: String, reason: String },

    #[error("invalid base58 instruction data: {0}")]
    InvalidData(#[from] bs58::decode::Error),

    #[error("transaction has no signatures")]
    MissingSignature,

    #[error("invalid signature {0}")]
    InvalidSignature(String),
}
