//! Lock Manager Tests
//!
//! Tests verify:
//! - Writer exclusivity and re-entrant acquisition by the same transaction
//! - Readers never blocked, even under an active writer
//! - Active readers block new writers until released
//! - Release bookkeeping (repeat releases, idle entry cleanup)
//! - Contention between concurrent writers

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use ramptxn::lock::{LockHolder, LockManager};
use ramptxn::TransactionId;

const T1: TransactionId = TransactionId(1);
const T2: TransactionId = TransactionId(2);
const T3: TransactionId = TransactionId(3);
const R1: TransactionId = TransactionId(101);
const R2: TransactionId = TransactionId(102);

// =============================================================================
// Writer Tests
// =============================================================================

#[test]
fn test_writer_acquires_free_key() {
    let locks = LockManager::new();

    assert!(locks.acquire_as_writer(b"k", T1));
    assert_eq!(locks.writer_of(b"k"), Some(T1));
}

#[test]
fn test_second_writer_refused() {
    let locks = LockManager::new();

    assert!(locks.acquire_as_writer(b"k", T1));
    assert!(!locks.acquire_as_writer(b"k", T2));
    assert_eq!(locks.writer_of(b"k"), Some(T1));
}

#[test]
fn test_writer_reacquire_same_transaction() {
    let locks = LockManager::new();

    assert!(locks.acquire_as_writer(b"k", T1));
    assert!(locks.acquire_as_writer(b"k", T1));
    assert_eq!(locks.writer_of(b"k"), Some(T1));
}

#[test]
fn test_writer_release_allows_next_writer() {
    let locks = LockManager::new();

    assert!(locks.acquire_as_writer(b"k", T1));
    assert!(locks.release(b"k", LockHolder::Writer(T1)));
    assert!(locks.acquire_as_writer(b"k", T2));
}

#[test]
fn test_release_by_non_holder_is_noop() {
    let locks = LockManager::new();

    assert!(locks.acquire_as_writer(b"k", T1));
    assert!(!locks.release(b"k", LockHolder::Writer(T2)));
    assert_eq!(locks.writer_of(b"k"), Some(T1));

    assert!(!locks.release(b"unheld", LockHolder::Reader(R1)));
}

#[test]
fn test_keys_are_independent() {
    let locks = LockManager::new();

    assert!(locks.acquire_as_writer(b"a", T1));
    assert!(locks.acquire_as_writer(b"b", T2));
    assert_eq!(locks.writer_of(b"a"), Some(T1));
    assert_eq!(locks.writer_of(b"b"), Some(T2));
}

// =============================================================================
// Reader Tests
// =============================================================================

#[test]
fn test_reader_joins_active_writer() {
    let locks = LockManager::new();

    assert!(locks.acquire_as_writer(b"k", T1));
    locks.acquire_as_reader(b"k", R1);

    assert_eq!(locks.writer_of(b"k"), Some(T1));
    assert_eq!(locks.reader_count(b"k"), 1);
}

#[test]
fn test_reader_blocks_new_writer() {
    let locks = LockManager::new();

    locks.acquire_as_reader(b"k", R1);
    assert!(!locks.acquire_as_writer(b"k", T1));

    locks.release(b"k", LockHolder::Reader(R1));
    assert!(locks.acquire_as_writer(b"k", T1));
}

#[test]
fn test_reader_joined_under_writer_blocks_writer_after_commit() {
    let locks = LockManager::new();

    assert!(locks.acquire_as_writer(b"k", T1));
    locks.acquire_as_reader(b"k", R1);
    locks.release(b"k", LockHolder::Writer(T1));

    assert!(!locks.acquire_as_writer(b"k", T2));
    locks.release(b"k", LockHolder::Reader(R1));
    assert!(locks.acquire_as_writer(b"k", T2));
}

#[test]
fn test_multiple_readers_all_must_release() {
    let locks = LockManager::new();

    locks.acquire_as_reader(b"k", R1);
    locks.acquire_as_reader(b"k", R2);
    assert_eq!(locks.reader_count(b"k"), 2);

    locks.release(b"k", LockHolder::Reader(R1));
    assert!(!locks.acquire_as_writer(b"k", T1));

    locks.release(b"k", LockHolder::Reader(R2));
    assert!(locks.acquire_as_writer(b"k", T1));
}

#[test]
fn test_reader_acquire_is_idempotent() {
    let locks = LockManager::new();

    locks.acquire_as_reader(b"k", R1);
    locks.acquire_as_reader(b"k", R1);
    assert_eq!(locks.reader_count(b"k"), 1);

    assert!(locks.release(b"k", LockHolder::Reader(R1)));
    assert!(!locks.release(b"k", LockHolder::Reader(R1)));
    assert!(locks.acquire_as_writer(b"k", T1));
}

#[test]
fn test_idle_keys_are_dropped() {
    let locks = LockManager::new();

    assert!(locks.acquire_as_writer(b"a", T1));
    locks.acquire_as_reader(b"b", R1);
    assert_eq!(locks.held_key_count(), 2);

    locks.release(b"a", LockHolder::Writer(T1));
    locks.release(b"b", LockHolder::Reader(R1));
    assert_eq!(locks.held_key_count(), 0);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_writers_exactly_one_wins() {
    let locks = Arc::new(LockManager::new());
    let barrier = Arc::new(Barrier::new(3));
    let winners = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = [T1, T2, T3]
        .into_iter()
        .map(|tid| {
            let locks = Arc::clone(&locks);
            let barrier = Arc::clone(&barrier);
            let winners = Arc::clone(&winners);
            thread::spawn(move || {
                barrier.wait();
                if locks.acquire_as_writer(b"k", tid) {
                    winners.fetch_add(1, Ordering::SeqCst);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(winners.load(Ordering::SeqCst), 1);
}

#[test]
fn test_contending_writers_take_turns() {
    let locks = LockManager::new();

    assert!(locks.acquire_as_writer(b"k", T1));
    assert!(!locks.acquire_as_writer(b"k", T2));
    assert!(!locks.acquire_as_writer(b"k", T3));

    locks.release(b"k", LockHolder::Writer(T1));

    // Exactly one of the two waiting writers gets it next
    let t2 = locks.acquire_as_writer(b"k", T2);
    let t3 = locks.acquire_as_writer(b"k", T3);
    assert!(t2 ^ t3);
}

#[test]
fn test_mutual_exclusion_under_load() {
    let locks = Arc::new(LockManager::new());
    let inside = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (1..=8u64)
        .map(|n| {
            let locks = Arc::clone(&locks);
            let inside = Arc::clone(&inside);
            thread::spawn(move || {
                let tid = TransactionId(n);
                let mut entered = 0;
                while entered < 50 {
                    if locks.acquire_as_writer(b"hot", tid) {
                        assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                        inside.fetch_sub(1, Ordering::SeqCst);
                        assert!(locks.release(b"hot", LockHolder::Writer(tid)));
                        entered += 1;
                    } else {
                        thread::yield_now();
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(locks.writer_of(b"hot"), None);
}
