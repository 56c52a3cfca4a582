//! # ramptxn
//!
//! Read-atomic multi-key transactions over a partitioned key-value store:
//! - Write-only transactions: per-key prepare under a write lock, then commit
//! - Read-only transactions: four rounds that never observe a fraction of a
//!   multi-key write, without any global lock
//! - Per-key asymmetric RW lock and append-only write provenance on servers
//! - TCP-based coordinator/server protocol
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Client (coordinator)                     │
//! │        WriteCoordinator            ReadCoordinator          │
//! │                                   + consistency::check      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ Transport (routed by key)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   TCP Server / Node                         │
//! │     write_op · commit · read_op · read_previous · release   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ LockManager │          │    Store    │
//!   │  (per key)  │          │  (history)  │
//!   └─────────────┘          └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod types;
pub mod txn_id;

pub mod lock;
pub mod store;
pub mod node;
pub mod protocol;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, TxnError};
pub use config::{ClientConfig, Config, RetryPolicy};
pub use client::{Client, LocalTransport, TcpTransport, Transport};
pub use node::Node;
pub use types::{
    Key, ReadResult, ReadTransaction, TransactionId, Value, WriteRecord, WriteRequest,
    WriteStatus, WriteTransaction,
};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of ramptxn
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
