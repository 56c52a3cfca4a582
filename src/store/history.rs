//! Per-key write history
//!
//! Append-only list of records with a transaction id index.

use std::collections::HashMap;

use crate::types::{TransactionId, Value, WriteRecord};

/// Versions of one key, oldest first
#[derive(Debug, Default, Clone)]
pub struct KeyHistory {
    records: Vec<WriteRecord>,
    index: HashMap<TransactionId, usize>,
}

impl KeyHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `record` as the new head
    ///
    /// Returns `false` without changing anything if the writer already has
    /// a record here.
    pub fn append(&mut self, record: WriteRecord) -> bool {
        if self.index.contains_key(&record.writer_transaction_id) {
            return false;
        }
        self.index
            .insert(record.writer_transaction_id, self.records.len());
        self.records.push(record);
        true
    }

    /// Latest record
    pub fn head(&self) -> Option<&WriteRecord> {
        self.records.last()
    }

    /// Writer of the record just before the head
    pub fn previous_writer(&self) -> Option<TransactionId> {
        let len = self.records.len();
        if len < 2 {
            return None;
        }
        Some(self.records[len - 2].writer_transaction_id)
    }

    /// Record written by `tid`
    pub fn by_transaction_id(&self, tid: TransactionId) -> Option<&WriteRecord> {
        self.index.get(&tid).map(|&pos| &self.records[pos])
    }

    /// Value visible immediately before `tid`'s record
    ///
    /// `None` when `tid` was the first writer. When `tid` never wrote this
    /// key, its write is not part of the history at all, so the head is the
    /// answer.
    pub fn previous_to(&self, tid: TransactionId) -> Option<&Value> {
        match self.index.get(&tid) {
            Some(&0) => None,
            Some(&pos) => Some(&self.records[pos - 1].value),
            None => self.head().map(|r| &r.value),
        }
    }

    /// Drop the head if it belongs to `tid`
    ///
    /// Only the head can be uncommitted: its writer still holds the key's
    /// lock, so nothing was appended after it.
    pub fn pop_head_of(&mut self, tid: TransactionId) -> bool {
        match self.records.last() {
            Some(head) if head.writer_transaction_id == tid => {
                self.records.pop();
                self.index.remove(&tid);
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
