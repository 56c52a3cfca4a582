//! Lock Manager
//!
//! Tracks writer and reader holds for every key on this server.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;

use crate::types::{Key, TransactionId};

/// Who is releasing a lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockHolder {
    /// A write-only transaction holding the key through prepare → commit
    Writer(TransactionId),

    /// A read-only transaction holding the key through rounds 1 → 4
    Reader(TransactionId),
}

/// Lock state for one key
#[derive(Debug, Default)]
struct KeyLock {
    writer: Option<TransactionId>,
    readers: HashSet<TransactionId>,
}

impl KeyLock {
    fn is_idle(&self) -> bool {
        self.writer.is_none() && self.readers.is_empty()
    }
}

/// Manages per-key locks
///
/// ## Concurrency:
/// - One mutex over the lock table; every operation is a short critical
///   section and never blocks while holding it
/// - Idle keys are removed so the table only tracks held keys
pub struct LockManager {
    locks: Mutex<HashMap<Key, KeyLock>>,
}

impl LockManager {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Try to take `key` as a writer (non-blocking)
    ///
    /// Fails when any reader holds the key or a different writer holds it.
    /// Re-acquiring by the transaction that already holds it succeeds, so a
    /// retried `write_op` whose first reply was lost is harmless.
    pub fn acquire_as_writer(&self, key: &[u8], tid: TransactionId) -> bool {
        let mut locks = self.locks.lock();
        let entry = locks.entry(key.to_vec()).or_default();

        match entry.writer {
            Some(holder) if holder == tid => true,
            Some(_) => false,
            None if !entry.readers.is_empty() => false,
            None => {
                entry.writer = Some(tid);
                true
            }
        }
    }

    /// Register `reader` on `key`. Always succeeds.
    ///
    /// Does not wait for an in-flight writer, but blocks later writers.
    pub fn acquire_as_reader(&self, key: &[u8], reader: TransactionId) {
        let mut locks = self.locks.lock();
        locks.entry(key.to_vec()).or_default().readers.insert(reader);
    }

    /// Release a hold on `key`
    ///
    /// Returns `false` if `holder` did not hold the key (repeat release).
    pub fn release(&self, key: &[u8], holder: LockHolder) -> bool {
        let mut locks = self.locks.lock();
        let Some(entry) = locks.get_mut(key) else {
            return false;
        };

        let released = match holder {
            LockHolder::Writer(tid) => {
                if entry.writer == Some(tid) {
                    entry.writer = None;
                    true
                } else {
                    false
                }
            }
            LockHolder::Reader(reader) => entry.readers.remove(&reader),
        };

        if entry.is_idle() {
            locks.remove(key);
        }

        released
    }

    /// Current writer of `key`, if any
    pub fn writer_of(&self, key: &[u8]) -> Option<TransactionId> {
        self.locks.lock().get(key).and_then(|entry| entry.writer)
    }

    /// Number of readers currently holding `key`
    pub fn reader_count(&self, key: &[u8]) -> usize {
        self.locks
            .lock()
            .get(key)
            .map(|entry| entry.readers.len())
            .unwrap_or(0)
    }

    /// Number of keys with at least one hold
    pub fn held_key_count(&self) -> usize {
        self.locks.lock().len()
    }
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new()
    }
}
