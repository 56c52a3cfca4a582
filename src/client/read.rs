//! Read Coordinator
//!
//! Drives a read-only transaction through its four rounds:
//!
//! ```text
//! Round 1  read_op        every key        (takes reader holds)
//! Round 2  consistency    local            (decides the re-read checklist)
//! Round 3  read_previous  checklist only
//! Round 4  release_lock   every key        (always, exactly once per key)
//! ```
//!
//! Rounds are strictly sequential; tasks inside a round run concurrently.

use std::collections::BTreeMap;

use super::consistency;
use super::retry::{fan_out, with_rpc_retries};
use super::transport::key_list;
use super::Transport;
use crate::config::RetryPolicy;
use crate::error::Result;
use crate::types::{Key, TransactionId, Value};

/// Coordinates one read-only transaction
pub struct ReadCoordinator<'a, T: Transport + ?Sized> {
    transport: &'a T,
    policy: &'a RetryPolicy,
    reader: TransactionId,
}

impl<'a, T: Transport + ?Sized> ReadCoordinator<'a, T> {
    pub fn new(transport: &'a T, policy: &'a RetryPolicy, reader: TransactionId) -> Self {
        Self {
            transport,
            policy,
            reader,
        }
    }

    /// Read `keys` atomically
    ///
    /// Reader holds are released for every key before returning, whether
    /// the earlier rounds succeeded or not.
    pub fn run(&self, keys: &[Key]) -> Result<BTreeMap<Key, Option<Value>>> {
        tracing::debug!("{}: read [{}]", self.reader, key_list(keys.iter()));

        let outcome = self.resolve(keys);
        let released = self.release_all(keys);

        let values = outcome?;
        released?;
        Ok(values)
    }

    /// Rounds 1 to 3
    fn resolve(&self, keys: &[Key]) -> Result<BTreeMap<Key, Option<Value>>> {
        // Round 1: initial reads
        let reads = fan_out("read", keys, |key| {
            with_rpc_retries(self.policy, "read_op", || self.transport.read_op(key, self.reader))
        })?;

        let mut initial = BTreeMap::new();
        for (key, result) in keys.iter().zip(reads) {
            initial.insert(key.clone(), result?);
        }

        // Round 2: consistency check
        let consistency::Resolution {
            mut finalized,
            checklist,
        } = consistency::check(&initial);

        if checklist.is_empty() {
            return Ok(finalized);
        }

        // Round 3: selective re-read
        let entries: Vec<(Key, TransactionId)> = checklist.into_iter().collect();
        tracing::debug!(
            "{}: re-reading [{}]",
            self.reader,
            key_list(entries.iter().map(|(k, _)| k))
        );

        let rereads = fan_out("read_previous", &entries, |(key, writer)| {
            with_rpc_retries(self.policy, "read_previous", || {
                self.transport.read_previous(key, *writer)
            })
        })?;

        for ((key, _), value) in entries.into_iter().zip(rereads) {
            finalized.insert(key, value?);
        }

        Ok(finalized)
    }

    /// Round 4: drop the reader hold on every key
    fn release_all(&self, keys: &[Key]) -> Result<()> {
        let results = fan_out("release_lock", keys, |key| {
            with_rpc_retries(self.policy, "release_lock", || {
                self.transport.release_lock(key, self.reader)
            })
        })?;

        let mut first_err = None;
        for (key, result) in keys.iter().zip(results) {
            if let Err(e) = result {
                tracing::error!(
                    "{}: release of {:?} failed, writers stay blocked: {}",
                    self.reader,
                    key,
                    e
                );
                first_err.get_or_insert(e);
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
