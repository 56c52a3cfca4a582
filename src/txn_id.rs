//! Transaction id issuance
//!
//! Ids must be globally unique and stable across all per-key operations of
//! one transaction. The issuer is an explicit collaborator handed to the
//! client rather than ambient state.
//!
//! ## Id Layout ([`SequentialIssuer`])
//! ```text
//! ┌────────────────────┬──────────────────────────────────────┐
//! │ client id (24 bit) │        local sequence (40 bit)       │
//! └────────────────────┴──────────────────────────────────────┘
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::TransactionId;

/// Number of low bits reserved for the per-client sequence
pub const SEQUENCE_BITS: u32 = 40;

/// Largest client id that fits the layout
pub const MAX_CLIENT_ID: u32 = (1 << (64 - SEQUENCE_BITS)) - 1;

/// Source of fresh transaction ids
pub trait TransactionIdIssuer: Send + Sync {
    /// Return an id never returned before by any issuer in the deployment
    fn next_id(&self) -> TransactionId;
}

/// Issuer that prefixes a local counter with a deployment-unique client id
///
/// Uniqueness across clients relies on each client being configured with a
/// distinct `client_id`.
#[derive(Debug)]
pub struct SequentialIssuer {
    prefix: u64,
    sequence: AtomicU64,
}

impl SequentialIssuer {
    pub fn new(client_id: u32) -> Self {
        Self {
            prefix: u64::from(client_id & MAX_CLIENT_ID) << SEQUENCE_BITS,
            sequence: AtomicU64::new(0),
        }
    }
}

impl TransactionIdIssuer for SequentialIssuer {
    fn next_id(&self) -> TransactionId {
        // Sequence starts at 1 so that id 0 is never issued
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        TransactionId(self.prefix | (seq & ((1 << SEQUENCE_BITS) - 1)))
    }
}
