//! Consistency Checker
//!
//! Round 2 of a read-only transaction. Runs locally over the round-1 results
//! and decides which keys show a write that may not be complete.
//!
//! ## Rule
//! A write-only transaction `T` commits a key only after it prepared every
//! key it writes, and is never aborted once a commit went out. So `T` is
//! known to be committed when the read set shows:
//! - some record by `T` that is no longer pending, or
//! - a pending record whose previous writer is `T` (that record's writer
//!   could only lock the key after `T` committed it)
//!
//! For key `k` observed with writer `T`:
//! - committed record: final
//! - pending, `T` known committed: final (`T` prepared every sibling, and
//!   whatever a sibling shows is `T` or supersedes it)
//! - pending, no such evidence: `T` may still be preparing, or may abort,
//!   so `k` is read as of just before `T`
//!
//! Keys needing that re-read go to the checklist as `(k, T)`; all others are
//! final with their round-1 value. Rolled-back keys fall back to committed
//! records, whose writers are themselves in the evidence set.

use std::collections::{BTreeMap, HashSet};

use crate::types::{Key, ReadResult, TransactionId, Value};

/// Outcome of the consistency check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Keys whose round-1 value is final
    pub finalized: BTreeMap<Key, Option<Value>>,

    /// Keys to re-read with `read_previous(key, writer)`
    pub checklist: BTreeMap<Key, TransactionId>,
}

/// Split round-1 results into final values and keys to re-read
pub fn check(initial: &BTreeMap<Key, ReadResult>) -> Resolution {
    let committed = committed_writers(initial);
    let mut resolution = Resolution::default();

    for (key, result) in initial {
        match unconfirmed_writer(result, &committed) {
            Some(writer) => {
                tracing::debug!(
                    "key {:?}: writer {} not known committed ({}), re-reading",
                    String::from_utf8_lossy(key),
                    writer,
                    sibling_summary(result, writer, initial)
                );
                resolution.checklist.insert(key.clone(), writer);
            }
            None => {
                resolution.finalized.insert(key.clone(), result.value.clone());
            }
        }
    }

    resolution
}

/// Writers the read set proves committed
fn committed_writers(initial: &BTreeMap<Key, ReadResult>) -> HashSet<TransactionId> {
    let mut committed = HashSet::new();
    for result in initial.values() {
        match (result.writer_transaction_id, result.pending) {
            (Some(writer), false) => {
                committed.insert(writer);
            }
            (Some(_), true) => {
                committed.extend(result.previous_writer_transaction_id);
            }
            (None, _) => {}
        }
    }
    committed
}

/// The writer of `result` if its record is pending and not known committed
fn unconfirmed_writer(
    result: &ReadResult,
    committed: &HashSet<TransactionId>,
) -> Option<TransactionId> {
    let writer = result.writer_transaction_id?;
    (result.pending && !committed.contains(&writer)).then_some(writer)
}

/// "partial" when a sibling read shows another writer, else "prepared"
fn sibling_summary(
    result: &ReadResult,
    writer: TransactionId,
    initial: &BTreeMap<Key, ReadResult>,
) -> &'static str {
    let partial = result
        .sibling_keys
        .iter()
        .filter_map(|sibling| initial.get(sibling))
        .any(|observed| observed.writer_transaction_id != Some(writer));

    if partial {
        "partial"
    } else {
        "prepared"
    }
}
