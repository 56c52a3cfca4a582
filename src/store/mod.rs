//! Store Module
//!
//! In-memory values plus per-key write provenance.
//!
//! ## Responsibilities
//! - Keep the current (head) value of every key
//! - Keep the full append-only write history of every key, indexed by
//!   transaction id, so `read_previous` can resolve any writer
//! - Record, with each value, which transaction wrote it and which other
//!   keys that transaction wrote
//!
//! ## Layout
//! ```text
//! key ──► KeyHistory
//!         ┌──────────────┬──────────────┬─────┬──────────────┐
//!         │ WriteRecord0 │ WriteRecord1 │ ... │ WriteRecordN │ ◄─ head
//!         └──────────────┴──────────────┴─────┴──────────────┘
//!         index: TransactionId ──► position
//! ```

mod history;
mod table;

pub use history::KeyHistory;
pub use table::Store;

use std::collections::BTreeSet;

use crate::types::{Key, TransactionId};

/// Metadata kinds recorded alongside each value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataKind {
    /// Id of the transaction that wrote the value
    WriterTransactionId,

    /// Other keys written by that transaction
    SiblingKeys,
}

/// A metadata value, shaped by its kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Metadata {
    WriterTransactionId(TransactionId),
    SiblingKeys(BTreeSet<Key>),
}
