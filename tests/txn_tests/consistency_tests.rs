//! Consistency Checker Tests
//!
//! Round-2 decisions over hand-built round-1 results.

use std::collections::BTreeMap;

use ramptxn::client::consistency::{check, Resolution};
use ramptxn::{Key, ReadResult, TransactionId};

const T0: TransactionId = TransactionId(1);
const T1: TransactionId = TransactionId(2);
const T2: TransactionId = TransactionId(3);

fn committed(value: &str, writer: TransactionId, siblings: &[&str]) -> ReadResult {
    ReadResult {
        value: Some(value.as_bytes().to_vec()),
        writer_transaction_id: Some(writer),
        sibling_keys: siblings.iter().map(|s| s.as_bytes().to_vec()).collect(),
        pending: false,
        previous_writer_transaction_id: None,
    }
}

fn pending(
    value: &str,
    writer: TransactionId,
    siblings: &[&str],
    previous: Option<TransactionId>,
) -> ReadResult {
    ReadResult {
        pending: true,
        previous_writer_transaction_id: previous,
        ..committed(value, writer, siblings)
    }
}

fn k(name: &str) -> Key {
    name.as_bytes().to_vec()
}

fn reads(entries: Vec<(&str, ReadResult)>) -> BTreeMap<Key, ReadResult> {
    entries.into_iter().map(|(key, r)| (k(key), r)).collect()
}

// =============================================================================
// Committed Records
// =============================================================================

#[test]
fn test_all_committed_is_final() {
    let initial = reads(vec![
        ("a", committed("a0", T0, &["b"])),
        ("b", committed("b1", T1, &[])),
    ]);

    let Resolution {
        finalized,
        checklist,
    } = check(&initial);

    assert!(checklist.is_empty());
    assert_eq!(finalized[&k("a")], Some(b"a0".to_vec()));
    assert_eq!(finalized[&k("b")], Some(b"b1".to_vec()));
}

#[test]
fn test_unwritten_keys_are_final() {
    let initial = reads(vec![("a", ReadResult::empty()), ("b", ReadResult::empty())]);

    let resolution = check(&initial);

    assert!(resolution.checklist.is_empty());
    assert_eq!(resolution.finalized[&k("a")], None);
}

#[test]
fn test_committed_writer_superseded_on_sibling_is_final() {
    // T1 committed {a, b}; T2 later overwrote b
    let initial = reads(vec![
        ("a", committed("a1", T1, &["b"])),
        ("b", committed("b2", T2, &[])),
    ]);

    let resolution = check(&initial);

    assert!(resolution.checklist.is_empty());
    assert_eq!(resolution.finalized[&k("a")], Some(b"a1".to_vec()));
    assert_eq!(resolution.finalized[&k("b")], Some(b"b2".to_vec()));
}

// =============================================================================
// Pending Records
// =============================================================================

#[test]
fn test_partial_pending_writer_goes_to_checklist() {
    // T1 prepared `a` but has not reached `b`
    let initial = reads(vec![
        ("a", pending("a1", T1, &["b"], Some(T0))),
        ("b", committed("b0", T0, &["a"])),
    ]);

    let resolution = check(&initial);

    assert_eq!(resolution.checklist, BTreeMap::from([(k("a"), T1)]));
    assert_eq!(resolution.finalized, BTreeMap::from([(k("b"), Some(b"b0".to_vec()))]));
}

#[test]
fn test_partial_against_unwritten_sibling() {
    let initial = reads(vec![
        ("a", pending("a1", T1, &["b"], None)),
        ("b", ReadResult::empty()),
    ]);

    let resolution = check(&initial);

    assert_eq!(resolution.checklist.get(&k("a")), Some(&T1));
    assert_eq!(resolution.finalized.get(&k("b")), Some(&None));
}

#[test]
fn test_pending_everywhere_is_rolled_back() {
    // T1 prepared both keys but has committed neither; it may still abort
    let initial = reads(vec![
        ("a", pending("a1", T1, &["b"], None)),
        ("b", pending("b1", T1, &["a"], None)),
    ]);

    let resolution = check(&initial);

    assert_eq!(
        resolution.checklist,
        BTreeMap::from([(k("a"), T1), (k("b"), T1)])
    );
    assert!(resolution.finalized.is_empty());
}

#[test]
fn test_pending_with_siblings_outside_read_set_rolled_back() {
    let initial = reads(vec![("a", pending("a1", T1, &["zzz"], None))]);

    let resolution = check(&initial);

    assert_eq!(resolution.checklist.get(&k("a")), Some(&T1));
}

#[test]
fn test_writer_committed_elsewhere_keeps_pending_value() {
    // T1 wrote {k, s, t}; commit reached s and t, then T2 overwrote s
    let initial = reads(vec![
        ("k", pending("k1", T1, &["s", "t"], Some(T0))),
        ("s", committed("s2", T2, &[])),
        ("t", committed("t1", T1, &["k", "s"])),
    ]);

    let resolution = check(&initial);

    assert!(resolution.checklist.is_empty());
    assert_eq!(resolution.finalized[&k("k")], Some(b"k1".to_vec()));
    assert_eq!(resolution.finalized[&k("t")], Some(b"t1".to_vec()));
}

#[test]
fn test_superseded_writer_counts_as_committed() {
    // T0 wrote {k, x} and committed k; T1 then locked k. T0 is still
    // pending on x, but T1 holding k proves T0 committed.
    let initial = reads(vec![
        ("k", pending("k1", T1, &[], Some(T0))),
        ("x", pending("x0", T0, &["k"], None)),
    ]);

    let resolution = check(&initial);

    assert_eq!(resolution.checklist, BTreeMap::from([(k("k"), T1)]));
    assert_eq!(resolution.finalized[&k("x")], Some(b"x0".to_vec()));
}

#[test]
fn test_every_partially_visible_key_rolled_back() {
    // T1 wrote {a, b, c}; a and b prepared, c not yet
    let initial = reads(vec![
        ("a", pending("a1", T1, &["b", "c"], None)),
        ("b", pending("b1", T1, &["a", "c"], None)),
        ("c", committed("c0", T0, &[])),
    ]);

    let resolution = check(&initial);

    assert_eq!(
        resolution.checklist,
        BTreeMap::from([(k("a"), T1), (k("b"), T1)])
    );
    assert_eq!(resolution.finalized.len(), 1);
}

#[test]
fn test_every_key_resolved_exactly_once() {
    let initial = reads(vec![
        ("a", pending("a1", T1, &["b"], None)),
        ("b", committed("b0", T0, &[])),
        ("c", ReadResult::empty()),
        ("d", pending("d2", T2, &["c"], Some(T1))),
    ]);

    let resolution = check(&initial);

    for key in initial.keys() {
        let in_final = resolution.finalized.contains_key(key);
        let in_check = resolution.checklist.contains_key(key);
        assert!(in_final ^ in_check, "key {:?} resolved twice or not at all", key);
    }
}
