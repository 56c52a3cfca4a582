//! Transport
//!
//! The RPC boundary between coordinators and servers. A transport routes
//! each request to the server owning its key and returns the typed reply.

use std::sync::Arc;

use super::Router;
use crate::error::{Result, TxnError};
use crate::node::Node;
use crate::protocol::{Reply, Request};
use crate::types::{Key, ReadResult, TransactionId, Value, WriteRequest, WriteStatus};

/// Invokes remote operations on the server owning a key
///
/// Implementors provide `call`; the typed operations are built on top of
/// it. Must be `Sync`: coordinators call it from one thread per key.
pub trait Transport: Send + Sync {
    /// Deliver `request` to the server owning its key and wait for the reply
    fn call(&self, request: Request) -> Result<Reply>;

    fn write_op(&self, req: &WriteRequest) -> Result<WriteStatus> {
        match self.call(Request::Write(req.clone()))? {
            Reply::Write(status) => Ok(status),
            other => Err(unexpected("write_op", other)),
        }
    }

    fn commit(&self, req: &WriteRequest) -> Result<()> {
        expect_ack("commit", self.call(Request::Commit(req.clone()))?)
    }

    fn abort(&self, req: &WriteRequest) -> Result<()> {
        expect_ack("abort", self.call(Request::Abort(req.clone()))?)
    }

    fn read_op(&self, key: &[u8], reader: TransactionId) -> Result<ReadResult> {
        let request = Request::Read {
            key: key.to_vec(),
            reader,
        };
        match self.call(request)? {
            Reply::Read(result) => Ok(result),
            other => Err(unexpected("read_op", other)),
        }
    }

    fn read_previous(&self, key: &[u8], transaction_id: TransactionId) -> Result<Option<Value>> {
        let request = Request::ReadPrevious {
            key: key.to_vec(),
            transaction_id,
        };
        match self.call(request)? {
            Reply::Value(value) => Ok(value),
            other => Err(unexpected("read_previous", other)),
        }
    }

    fn read_history(&self, key: &[u8], transaction_id: TransactionId) -> Result<Option<Value>> {
        let request = Request::ReadHistory {
            key: key.to_vec(),
            transaction_id,
        };
        match self.call(request)? {
            Reply::Value(value) => Ok(value),
            other => Err(unexpected("read_history", other)),
        }
    }

    fn release_lock(&self, key: &[u8], reader: TransactionId) -> Result<()> {
        let request = Request::ReleaseLock {
            key: key.to_vec(),
            reader,
        };
        expect_ack("release_lock", self.call(request)?)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn call(&self, request: Request) -> Result<Reply> {
        (**self).call(request)
    }
}

fn expect_ack(op: &'static str, reply: Reply) -> Result<()> {
    match reply {
        Reply::Ack => Ok(()),
        other => Err(unexpected(op, other)),
    }
}

fn unexpected(op: &'static str, reply: Reply) -> TxnError {
    TxnError::UnexpectedReply {
        op,
        reply: format!("{:?}", reply),
    }
}

// =============================================================================
// In-process transport
// =============================================================================

/// Transport that calls `Node`s living in the same process
///
/// Keys are routed across the nodes exactly like `TcpTransport` routes them
/// across addresses.
pub struct LocalTransport {
    nodes: Vec<Arc<Node>>,
    router: Router,
}

impl LocalTransport {
    pub fn new(nodes: Vec<Arc<Node>>) -> Result<Self> {
        let router = Router::new(nodes.len())?;
        Ok(Self { nodes, router })
    }

    /// A transport over `count` fresh nodes
    pub fn with_nodes(count: usize) -> Result<Self> {
        Self::new((0..count).map(|_| Arc::new(Node::new())).collect())
    }

    /// Node owning `key`
    pub fn node_for(&self, key: &[u8]) -> &Arc<Node> {
        &self.nodes[self.router.route(key)]
    }

    pub fn nodes(&self) -> &[Arc<Node>] {
        &self.nodes
    }
}

impl Transport for LocalTransport {
    fn call(&self, request: Request) -> Result<Reply> {
        let node = match request.key() {
            Some(key) => self.node_for(key),
            None => &self.nodes[0],
        };
        Ok(node.execute(request))
    }
}

/// Keys of a request batch, for log lines
pub(crate) fn key_list<'a>(keys: impl Iterator<Item = &'a Key>) -> String {
    keys.map(|k| String::from_utf8_lossy(k).into_owned())
        .collect::<Vec<_>>()
        .join(",")
}
