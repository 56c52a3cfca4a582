//! Node Module
//!
//! Server-side request handlers for one data-holding server.
//!
//! ## Responsibilities
//! - Write path: `write_op` (prepare), `commit`, `abort`
//! - Read path: `read_op`, `read_previous`, `read_history`, `release_lock`
//! - Route decoded requests to the right handler
//!
//! ## Write Request States
//! ```text
//! REQUESTED ──lock ok──► LOCK_ACQUIRED ─► WRITTEN ─► AWAITING_COMMIT ─commit─► RELEASED
//!     │
//!     └──lock busy──► ABORTED (LockWaitAbort, client retries)
//! ```

use crate::lock::{LockHolder, LockManager};
use crate::protocol::{Reply, Request};
use crate::store::Store;
use crate::types::{ReadResult, TransactionId, Value, WriteRecord, WriteRequest, WriteStatus};

/// A data-holding server: lock table plus store
///
/// All handlers take `&self`; share a node between connection threads with
/// `Arc<Node>`.
pub struct Node {
    locks: LockManager,
    store: Store,
}

impl Node {
    pub fn new() -> Self {
        Self {
            locks: LockManager::new(),
            store: Store::new(),
        }
    }

    /// Handle a decoded request
    pub fn execute(&self, request: Request) -> Reply {
        match request {
            Request::Write(req) => Reply::Write(self.write_op(&req)),
            Request::Commit(req) => {
                self.commit(&req);
                Reply::Ack
            }
            Request::Abort(req) => {
                self.abort(&req);
                Reply::Ack
            }
            Request::Read { key, reader } => Reply::Read(self.read_op(&key, reader)),
            Request::ReadPrevious {
                key,
                transaction_id,
            } => Reply::Value(self.read_previous(&key, transaction_id)),
            Request::ReadHistory {
                key,
                transaction_id,
            } => Reply::Value(self.read_history(&key, transaction_id)),
            Request::ReleaseLock { key, reader } => {
                self.release_lock(&key, reader);
                Reply::Ack
            }
            Request::Ping => Reply::Pong,
        }
    }

    // =========================================================================
    // Write Path
    // =========================================================================

    /// Prepare one key of a write-only transaction
    ///
    /// Steps:
    /// 1. Try the writer lock (non-blocking)
    /// 2. Persist value + metadata as a new history record
    /// 3. Keep the lock until `commit`
    pub fn write_op(&self, req: &WriteRequest) -> WriteStatus {
        if !self.locks.acquire_as_writer(&req.key, req.transaction_id) {
            tracing::trace!(
                "write {:?} by {} refused: lock busy",
                req.key,
                req.transaction_id
            );
            return WriteStatus::LockWaitAbort;
        }

        if !self.store.write(&req.key, WriteRecord::from(req)) {
            tracing::debug!(
                "write {:?} by {} already recorded, treating retry as success",
                req.key,
                req.transaction_id
            );
        }

        WriteStatus::WriteSuccess
    }

    /// Commit one key: release the writer lock
    ///
    /// Writes cannot fail once the lock is held, so commit is unconditional.
    /// Repeat commits are no-ops.
    pub fn commit(&self, req: &WriteRequest) {
        if !self
            .locks
            .release(&req.key, LockHolder::Writer(req.transaction_id))
        {
            tracing::trace!("commit {:?} by {}: lock not held", req.key, req.transaction_id);
        }
    }

    /// Undo a prepared but uncommitted key and release its lock
    ///
    /// Does nothing unless `req.transaction_id` currently holds the key, so
    /// committed history is never touched.
    pub fn abort(&self, req: &WriteRequest) {
        if self.locks.writer_of(&req.key) != Some(req.transaction_id) {
            return;
        }

        self.store.remove_uncommitted(&req.key, req.transaction_id);
        self.locks
            .release(&req.key, LockHolder::Writer(req.transaction_id));
        tracing::debug!("aborted write {:?} by {}", req.key, req.transaction_id);
    }

    // =========================================================================
    // Read Path
    // =========================================================================

    /// Round-1 read: take a reader hold and return value plus provenance
    ///
    /// The hold stays until `release_lock`. An in-flight writer is not waited
    /// for; its value is returned with `pending` set.
    pub fn read_op(&self, key: &[u8], reader: TransactionId) -> ReadResult {
        self.locks.acquire_as_reader(key, reader);

        loop {
            let Some((record, previous)) = self.store.read_with_previous_writer(key) else {
                return ReadResult::empty();
            };
            let writer = record.writer_transaction_id;

            let pending = self.locks.writer_of(key) == Some(writer);

            // Lock gone: either committed, or aborted after we read the head.
            // Abort removes the record before releasing, so check it is still there.
            if !pending && self.store.read_by_transaction_id(key, writer).is_none() {
                tracing::trace!("read {:?}: head by {} aborted, re-reading", key, writer);
                continue;
            }

            return ReadResult {
                value: Some(record.value),
                writer_transaction_id: Some(writer),
                sibling_keys: record.sibling_keys,
                pending,
                previous_writer_transaction_id: previous,
            };
        }
    }

    /// Value `key` held immediately before `tid`'s write
    pub fn read_previous(&self, key: &[u8], tid: TransactionId) -> Option<Value> {
        self.store.read_previous_to(key, tid)
    }

    /// Value `tid` wrote to `key`, if any
    ///
    /// Needs no lock: history is append-only.
    pub fn read_history(&self, key: &[u8], tid: TransactionId) -> Option<Value> {
        self.store.read_by_transaction_id(key, tid)
    }

    /// Drop the reader hold taken by `read_op`
    pub fn release_lock(&self, key: &[u8], reader: TransactionId) {
        if !self.locks.release(key, LockHolder::Reader(reader)) {
            tracing::trace!("release {:?} by {}: not held", key, reader);
        }
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn locks(&self) -> &LockManager {
        &self.locks
    }

    pub fn store(&self) -> &Store {
        &self.store
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}
