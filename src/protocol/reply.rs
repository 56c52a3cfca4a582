//! Reply definitions
//!
//! Typed replies and the status-framed response carrying them.

use serde::{Deserialize, Serialize};

use super::MAX_PAYLOAD_SIZE;
use crate::error::{Result, TxnError};
use crate::types::{ReadResult, Value, WriteStatus};

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    Error = 0x02,
}

/// Typed body of an OK response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reply {
    /// Outcome of `Write`
    Write(WriteStatus),

    /// Outcome of `Read`
    Read(ReadResult),

    /// Outcome of `ReadPrevious` / `ReadHistory`
    Value(Option<Value>),

    /// `Commit`, `Abort`, `ReleaseLock` done
    Ack,

    Pong,
}

/// A response frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Encoded reply for OK, error message for ERROR
    pub payload: Vec<u8>,
}

impl Response {
    /// Create an OK response carrying `reply`
    pub fn ok(reply: &Reply) -> Result<Self> {
        let payload = bincode::serialize(reply)?;
        if payload.len() > MAX_PAYLOAD_SIZE as usize {
            return Err(TxnError::Protocol(format!(
                "response payload too large: {} bytes (max {})",
                payload.len(),
                MAX_PAYLOAD_SIZE
            )));
        }

        Ok(Self {
            status: Status::Ok,
            payload,
        })
    }

    /// Create an ERROR response
    pub fn error(message: &str) -> Self {
        Self {
            status: Status::Error,
            payload: message.as_bytes().to_vec(),
        }
    }

    /// Decode the carried reply; ERROR frames become `TxnError::Remote`
    pub fn into_reply(self) -> Result<Reply> {
        match self.status {
            Status::Ok => Ok(bincode::deserialize(&self.payload)?),
            Status::Error => Err(TxnError::Remote(
                String::from_utf8_lossy(&self.payload).into_owned(),
            )),
        }
    }
}
