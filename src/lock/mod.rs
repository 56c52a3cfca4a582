//! Lock Manager Module
//!
//! Per-key asymmetric reader/writer lock.
//!
//! ## Semantics
//! - Any number of readers may hold a key at once
//! - At most one writer may hold a key
//! - A reader never waits: it joins even while a writer holds the key
//! - A held reader lock makes every *new* writer acquisition fail until
//!   the reader releases
//! - Writer acquisition never blocks; callers retry on `false`
//!
//! ## Lifetimes
//! - Writer locks are released by the client's commit (or abort)
//! - Reader locks are released by round 4 of the read-only transaction

mod manager;

pub use manager::{LockHolder, LockManager};
