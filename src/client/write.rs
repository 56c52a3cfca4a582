//! Write Coordinator
//!
//! Drives a write-only transaction through prepare and commit.
//!
//! ## Phases
//! 1. Prepare: `write_op` per key, concurrently. A `LockWaitAbort` is retried
//!    on the same key with bounded exponential backoff. Barrier.
//! 2. On failure (lock-wait deadline, transport): `abort` every key. Barrier.
//! 3. Commit: `commit` per key, concurrently. Barrier.

use std::thread;
use std::time::Instant;

use super::retry::{fan_out, with_rpc_retries};
use super::transport::key_list;
use super::Transport;
use crate::config::RetryPolicy;
use crate::error::{Result, TxnError};
use crate::types::{TransactionId, WriteRequest, WriteStatus};

/// Coordinates one write-only transaction
pub struct WriteCoordinator<'a, T: Transport + ?Sized> {
    transport: &'a T,
    policy: &'a RetryPolicy,
    transaction_id: TransactionId,
}

impl<'a, T: Transport + ?Sized> WriteCoordinator<'a, T> {
    pub fn new(transport: &'a T, policy: &'a RetryPolicy, transaction_id: TransactionId) -> Self {
        Self {
            transport,
            policy,
            transaction_id,
        }
    }

    /// Prepare and commit every request
    ///
    /// Returns once every key has committed, or after every key was
    /// aborted when preparation failed.
    pub fn run(&self, requests: &[WriteRequest]) -> Result<()> {
        tracing::debug!(
            "{}: prepare [{}]",
            self.transaction_id,
            key_list(requests.iter().map(|r| &r.key))
        );

        let prepared = fan_out("prepare", requests, |req| self.prepare(req))?;

        if let Some(err) = prepared.into_iter().find_map(|r| r.err()) {
            tracing::warn!("{}: prepare failed, aborting: {}", self.transaction_id, err);
            self.abort_all(requests);
            return Err(err);
        }

        self.commit_all(requests)?;
        tracing::debug!("{}: committed", self.transaction_id);
        Ok(())
    }

    /// Prepare one key, retrying while its lock is busy
    fn prepare(&self, req: &WriteRequest) -> Result<()> {
        let started = Instant::now();
        let mut backoff = self.policy.initial_backoff;
        let mut refusals = 0u64;

        loop {
            let status = with_rpc_retries(self.policy, "write_op", || self.transport.write_op(req))?;

            match status {
                WriteStatus::WriteSuccess => {
                    if refusals > 0 {
                        tracing::trace!(
                            "{}: lock on {:?} acquired after {} refusals",
                            self.transaction_id,
                            req.key,
                            refusals
                        );
                    }
                    return Ok(());
                }
                WriteStatus::LockWaitAbort => {
                    refusals += 1;
                    if let Some(limit) = self.policy.lock_wait_timeout {
                        if started.elapsed() >= limit {
                            return Err(TxnError::LockWaitTimeout {
                                key: req.key.clone(),
                                transaction_id: self.transaction_id,
                            });
                        }
                    }
                    thread::sleep(backoff);
                    backoff = self.policy.next_backoff(backoff);
                }
            }
        }
    }

    /// Best-effort abort of every key; keys never locked are no-ops
    fn abort_all(&self, requests: &[WriteRequest]) {
        let outcomes = fan_out("abort", requests, |req| {
            with_rpc_retries(self.policy, "abort", || self.transport.abort(req))
        });

        match outcomes {
            Ok(results) => {
                for (req, result) in requests.iter().zip(results) {
                    if let Err(e) = result {
                        tracing::error!(
                            "{}: abort of {:?} failed, lock may stay held: {}",
                            self.transaction_id,
                            req.key,
                            e
                        );
                    }
                }
            }
            Err(e) => tracing::error!("{}: abort round failed: {}", self.transaction_id, e),
        }
    }

    /// Release every writer lock
    fn commit_all(&self, requests: &[WriteRequest]) -> Result<()> {
        let results = fan_out("commit", requests, |req| {
            with_rpc_retries(self.policy, "commit", || self.transport.commit(req))
        })?;

        let mut first_err = None;
        for (req, result) in requests.iter().zip(results) {
            if let Err(e) = result {
                tracing::error!(
                    "{}: commit of {:?} failed, lock stays held: {}",
                    self.transaction_id,
                    req.key,
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
