//! Request definitions
//!
//! Remote operations a coordinator can invoke on a server.

use crate::types::{Key, TransactionId, WriteRequest};

/// Request op codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RequestType {
    Write = 0x01,
    Commit = 0x02,
    Abort = 0x03,
    Read = 0x04,
    ReadPrevious = 0x05,
    ReadHistory = 0x06,
    ReleaseLock = 0x07,
    Ping = 0x08,
}

impl RequestType {
    pub fn from_u8(byte: u8) -> Option<Self> {
        Some(match byte {
            0x01 => RequestType::Write,
            0x02 => RequestType::Commit,
            0x03 => RequestType::Abort,
            0x04 => RequestType::Read,
            0x05 => RequestType::ReadPrevious,
            0x06 => RequestType::ReadHistory,
            0x07 => RequestType::ReleaseLock,
            0x08 => RequestType::Ping,
            _ => return None,
        })
    }
}

/// A parsed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Prepare: lock the key and persist value + metadata
    Write(WriteRequest),

    /// Release the writer lock taken by `Write`
    Commit(WriteRequest),

    /// Undo an uncommitted `Write` and release its lock
    Abort(WriteRequest),

    /// Round-1 read; takes a reader hold
    Read { key: Key, reader: TransactionId },

    /// Value before `transaction_id`'s write
    ReadPrevious {
        key: Key,
        transaction_id: TransactionId,
    },

    /// Value written by `transaction_id`, if any
    ReadHistory {
        key: Key,
        transaction_id: TransactionId,
    },

    /// Drop the reader hold taken by `Read`
    ReleaseLock { key: Key, reader: TransactionId },

    /// Health check
    Ping,
}

impl Request {
    pub fn request_type(&self) -> RequestType {
        match self {
            Request::Write(_) => RequestType::Write,
            Request::Commit(_) => RequestType::Commit,
            Request::Abort(_) => RequestType::Abort,
            Request::Read { .. } => RequestType::Read,
            Request::ReadPrevious { .. } => RequestType::ReadPrevious,
            Request::ReadHistory { .. } => RequestType::ReadHistory,
            Request::ReleaseLock { .. } => RequestType::ReleaseLock,
            Request::Ping => RequestType::Ping,
        }
    }

    /// Key this request addresses (`None` for `Ping`)
    pub fn key(&self) -> Option<&[u8]> {
        match self {
            Request::Write(req) | Request::Commit(req) | Request::Abort(req) => Some(&req.key),
            Request::Read { key, .. }
            | Request::ReadPrevious { key, .. }
            | Request::ReadHistory { key, .. }
            | Request::ReleaseLock { key, .. } => Some(key),
            Request::Ping => None,
        }
    }
}
