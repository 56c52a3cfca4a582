//! Core data model
//!
//! Keys, values, transaction ids and the records exchanged between
//! coordinators and servers.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque key naming one unit of stored data
pub type Key = Vec<u8>;

/// Opaque payload stored under a key
pub type Value = Vec<u8>;

/// Globally unique, ordered transaction identifier
///
/// Issued once per transaction (see [`crate::txn_id`]) and carried by every
/// per-key operation of that transaction, which makes those operations
/// idempotent on retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn-{:#x}", self.0)
    }
}

/// Outcome of a `write_op`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteStatus {
    /// Lock acquired, value and metadata persisted, lock held until commit
    WriteSuccess,

    /// Lock held by someone else; the client retries this key
    LockWaitAbort,
}

/// One per-key write of a write-only transaction
///
/// `sibling_keys` holds every other key the same transaction writes, so the
/// server can record transaction membership alongside the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteRequest {
    pub key: Key,
    pub value: Value,
    pub transaction_id: TransactionId,
    pub sibling_keys: BTreeSet<Key>,
}

/// A stored version of a key
///
/// Immutable once appended to the key's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteRecord {
    pub value: Value,
    pub writer_transaction_id: TransactionId,
    pub sibling_keys: BTreeSet<Key>,
}

impl From<&WriteRequest> for WriteRecord {
    fn from(req: &WriteRequest) -> Self {
        Self {
            value: req.value.clone(),
            writer_transaction_id: req.transaction_id,
            sibling_keys: req.sibling_keys.clone(),
        }
    }
}

/// What a round-1 read observed for one key
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReadResult {
    /// Current head value (`None` if the key was never written)
    pub value: Option<Value>,

    /// Transaction that wrote the head value
    pub writer_transaction_id: Option<TransactionId>,

    /// Other keys written by that transaction
    pub sibling_keys: BTreeSet<Key>,

    /// True while the writer still holds the key's write lock, i.e. its
    /// commit has not reached this key yet
    pub pending: bool,

    /// Writer of the record before the head
    ///
    /// When the head is pending this writer has committed: it released the
    /// lock the head's writer now holds, and aborted records are removed
    /// before their lock is released.
    pub previous_writer_transaction_id: Option<TransactionId>,
}

impl ReadResult {
    /// Result for a key with no write history
    pub fn empty() -> Self {
        Self::default()
    }
}

/// A write-only transaction: the full set of keys and values to install
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteTransaction {
    pub writes: BTreeMap<Key, Value>,
}

impl WriteTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key/value pair (builder style)
    pub fn put(mut self, key: impl Into<Key>, value: impl Into<Value>) -> Self {
        self.writes.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Build the per-key requests, each carrying the full sibling set
    pub fn requests(&self, transaction_id: TransactionId) -> Vec<WriteRequest> {
        self.writes
            .iter()
            .map(|(key, value)| WriteRequest {
                key: key.clone(),
                value: value.clone(),
                transaction_id,
                sibling_keys: self
                    .writes
                    .keys()
                    .filter(|k| *k != key)
                    .cloned()
                    .collect(),
            })
            .collect()
    }
}

impl<K: Into<Key>, V: Into<Value>> FromIterator<(K, V)> for WriteTransaction {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            writes: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// A read-only transaction: the set of keys to read atomically
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadTransaction {
    pub keys: BTreeSet<Key>,
}

impl ReadTransaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.keys.insert(key.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<K: Into<Key>> FromIterator<K> for ReadTransaction {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().map(Into::into).collect(),
        }
    }
}
