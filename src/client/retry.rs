//! Retry and fan-out helpers shared by both coordinators.
//!
//! - [`with_rpc_retries`] retries one RPC on transport failure with
//!   exponential backoff
//! - [`fan_out`] runs one task per item on scoped threads and waits for all
//!   of them (a protocol round)

use std::thread;

use crate::config::RetryPolicy;
use crate::error::{Result, TxnError};

/// Run `attempt` until it succeeds, fails permanently, or the policy's
/// transport retries are used up.
///
/// Only transient errors (I/O, network) are retried. Every remote operation
/// is idempotent per transaction/reader id, so re-sending is safe.
pub fn with_rpc_retries<T, F>(policy: &RetryPolicy, description: &str, mut attempt: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut delay = policy.initial_backoff;

    for n in 0..=policy.rpc_retries {
        match attempt() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && n < policy.rpc_retries => {
                tracing::warn!(
                    attempt = n + 1,
                    max_retries = policy.rpc_retries,
                    delay_us = delay.as_micros() as u64,
                    description,
                    error = %e,
                    "RPC failed, retrying with backoff"
                );
                thread::sleep(delay);
                delay = policy.next_backoff(delay);
            }
            Err(e) => return Err(e),
        }
    }

    unreachable!()
}

/// Run `task` once per item, concurrently, and collect the results in item
/// order
///
/// Each task owns its result slot, so no shared map is written from more
/// than one thread. Returns only after every task finished.
pub fn fan_out<'a, I, R, F>(round: &'static str, items: &'a [I], task: F) -> Result<Vec<R>>
where
    I: Sync,
    R: Send,
    F: Fn(&'a I) -> R + Sync,
{
    let joined = crossbeam::thread::scope(|scope| {
        let task = &task;
        let handles: Vec<_> = items
            .iter()
            .map(|item| scope.spawn(move |_| task(item)))
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join())
            .collect::<std::result::Result<Vec<R>, _>>()
    });

    match joined {
        Ok(Ok(results)) => Ok(results),
        _ => Err(TxnError::TaskPanicked(round)),
    }
}
