//! Error types for ramptxn
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

use crate::types::TransactionId;

/// Result type alias using TxnError
pub type Result<T> = std::result::Result<T, TxnError>;

/// Unified error type for ramptxn operations
#[derive(Debug, Error)]
pub enum TxnError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The server processed the request and answered with an error frame
    #[error("Remote error: {0}")]
    Remote(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Transaction Errors
    // -------------------------------------------------------------------------
    /// Write lock on `key` stayed contended past the lock-wait deadline
    #[error("Lock wait timed out on key {key:?} for transaction {transaction_id}")]
    LockWaitTimeout {
        key: Vec<u8>,
        transaction_id: TransactionId,
    },

    /// A per-key task of a fan-out round panicked
    #[error("Task panicked during {0}")]
    TaskPanicked(&'static str),

    /// The server answered with a reply of the wrong kind
    #[error("Unexpected reply to {op}: {reply}")]
    UnexpectedReply { op: &'static str, reply: String },
}

impl From<bincode::Error> for TxnError {
    fn from(e: bincode::Error) -> Self {
        TxnError::Serialization(e.to_string())
    }
}

impl TxnError {
    /// Whether retrying the same RPC may succeed
    ///
    /// Transport-level failures are retryable; anything the remote side
    /// answered deliberately is not.
    pub fn is_transient(&self) -> bool {
        matches!(self, TxnError::Io(_) | TxnError::Network(_))
    }
}
