//! Store implementation
//!
//! HashMap of key histories behind a single RwLock.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::{KeyHistory, Metadata, MetadataKind};
use crate::types::{Key, TransactionId, Value, WriteRecord};

/// Keyed value storage with append-only write history
///
/// ## Concurrency:
/// - `histories`: RwLock (many concurrent readers, exclusive appender)
/// - A value and its metadata are installed in one critical section, so a
///   reader never sees a value without its provenance
pub struct Store {
    histories: RwLock<HashMap<Key, KeyHistory>>,
}

impl Store {
    pub fn new() -> Self {
        Self {
            histories: RwLock::new(HashMap::new()),
        }
    }

    /// Persist a value together with its writer metadata
    ///
    /// Returns `false` when this transaction already wrote `key`; the
    /// existing record is left untouched.
    pub fn write(&self, key: &[u8], record: WriteRecord) -> bool {
        let mut histories = self.histories.write();
        histories.entry(key.to_vec()).or_default().append(record)
    }

    /// Latest record for `key`
    pub fn read(&self, key: &[u8]) -> Option<WriteRecord> {
        let histories = self.histories.read();
        histories.get(key).and_then(|h| h.head().cloned())
    }

    /// Latest record plus the writer it superseded
    pub fn read_with_previous_writer(
        &self,
        key: &[u8],
    ) -> Option<(WriteRecord, Option<TransactionId>)> {
        let histories = self.histories.read();
        let history = histories.get(key)?;
        let head = history.head()?.clone();
        Some((head, history.previous_writer()))
    }

    /// One metadata field of the latest record
    pub fn read_metadata(&self, kind: MetadataKind, key: &[u8]) -> Option<Metadata> {
        let histories = self.histories.read();
        let head = histories.get(key)?.head()?;

        Some(match kind {
            MetadataKind::WriterTransactionId => {
                Metadata::WriterTransactionId(head.writer_transaction_id)
            }
            MetadataKind::SiblingKeys => Metadata::SiblingKeys(head.sibling_keys.clone()),
        })
    }

    /// Value written to `key` by `tid`, if that write exists
    pub fn read_by_transaction_id(&self, key: &[u8], tid: TransactionId) -> Option<Value> {
        let histories = self.histories.read();
        histories
            .get(key)
            .and_then(|h| h.by_transaction_id(tid))
            .map(|r| r.value.clone())
    }

    /// Value `key` held immediately before `tid`'s write
    pub fn read_previous_to(&self, key: &[u8], tid: TransactionId) -> Option<Value> {
        let histories = self.histories.read();
        histories
            .get(key)
            .and_then(|h| h.previous_to(tid))
            .cloned()
    }

    /// Remove `tid`'s record if it is still the head of `key`
    pub fn remove_uncommitted(&self, key: &[u8], tid: TransactionId) -> bool {
        let mut histories = self.histories.write();
        let Some(history) = histories.get_mut(key) else {
            return false;
        };

        let removed = history.pop_head_of(tid);
        if history.is_empty() {
            histories.remove(key);
        }
        removed
    }

    /// Number of records stored for `key`
    pub fn history_len(&self, key: &[u8]) -> usize {
        self.histories.read().get(key).map(KeyHistory::len).unwrap_or(0)
    }

    /// Number of keys with at least one record
    pub fn key_count(&self) -> usize {
        self.histories.read().len()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
