//! Supersession of in-flight lookups
//!
//! Every lookup is issued a ticket. Issuing a new ticket makes every older one
//! stale, and a result that comes back with a stale ticket is dropped instead
//! of being printed.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

/// Generation number of one lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    generation: u64,
    signature: String,
}

impl RequestTicket {
    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    current: Arc<AtomicU64>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a lookup for `signature`, superseding every earlier ticket.
    pub fn issue(&self, signature: &str) -> RequestTicket {
        let generation = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        RequestTicket {
            generation,
            signature: signature.to_string(),
        }
    }

    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        self.current.load(Ordering::SeqCst) == ticket.generation
    }

    /// `value` if `ticket` is still current, `None` if it has been superseded.
    pub fn accept<T>(&self, ticket: &RequestTicket, value: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(value)
        } else {
            tracing::debug!(
                signature = %ticket.signature,
                generation = ticket.generation,
                "discarding superseded lookup"
            );
            None
        }
    }
}
