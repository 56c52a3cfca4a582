//! Client Module
//!
//! Coordinator-side transaction library.
//!
//! ## Responsibilities
//! - Issue transaction ids (through a [`TransactionIdIssuer`])
//! - Run write-only transactions: prepare → commit
//! - Run read-only transactions: read → check → re-read → release
//! - Route every per-key RPC to the server owning the key
//!
//! ## Architecture
//! ```text
//!   Client ──► WriteCoordinator ─┐
//!          └─► ReadCoordinator ──┤ (one scoped thread per key per round)
//!                  │             ▼
//!                  │        Transport ──► Router ──► server for key
//!                  ▼
//!          consistency::check
//! ```

pub mod consistency;
mod read;
mod retry;
mod router;
mod tcp;
mod transport;
mod write;

pub use read::ReadCoordinator;
pub use retry::{fan_out, with_rpc_retries};
pub use router::Router;
pub use tcp::TcpTransport;
pub use transport::{LocalTransport, Transport};
pub use write::WriteCoordinator;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{ClientConfig, RetryPolicy};
use crate::error::Result;
use crate::txn_id::{SequentialIssuer, TransactionIdIssuer};
use crate::types::{Key, ReadTransaction, TransactionId, Value, WriteTransaction};

/// Transaction coordinator over some transport
pub struct Client<T: Transport> {
    transport: T,
    issuer: Arc<dyn TransactionIdIssuer>,
    retry: RetryPolicy,
}

impl Client<TcpTransport> {
    /// Create a TCP client from config
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let transport = TcpTransport::new(config)?;
        Ok(Self::new(
            transport,
            Arc::new(SequentialIssuer::new(config.client_id)),
            config.retry,
        ))
    }
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T, issuer: Arc<dyn TransactionIdIssuer>, retry: RetryPolicy) -> Self {
        Self {
            transport,
            issuer,
            retry,
        }
    }

    /// Run a write-only transaction
    ///
    /// Returns the transaction's id once every key has committed. On error
    /// every prepared key has been aborted.
    pub fn write_only_txn(&self, txn: &WriteTransaction) -> Result<TransactionId> {
        let transaction_id = self.issuer.next_id();
        if txn.is_empty() {
            return Ok(transaction_id);
        }

        let requests = txn.requests(transaction_id);
        WriteCoordinator::new(&self.transport, &self.retry, transaction_id).run(&requests)?;
        Ok(transaction_id)
    }

    /// Run a read-only transaction
    ///
    /// Returns a value (or `None` for never-written keys) for every
    /// requested key, after every reader hold has been released.
    pub fn read_only_txn(&self, txn: &ReadTransaction) -> Result<BTreeMap<Key, Option<Value>>> {
        if txn.is_empty() {
            return Ok(BTreeMap::new());
        }

        let reader = self.issuer.next_id();
        let keys: Vec<Key> = txn.keys.iter().cloned().collect();
        ReadCoordinator::new(&self.transport, &self.retry, reader).run(&keys)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
