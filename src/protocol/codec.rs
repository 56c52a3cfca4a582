//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Op (1)   │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Payload by Operation
//! - WRITE / COMMIT / ABORT:        bincode(WriteRequest)
//! - READ / RELEASE_LOCK:           bincode((key, reader))
//! - READ_PREVIOUS / READ_HISTORY:  bincode((key, transaction_id))
//! - PING:                          empty
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```

use std::io::{Read, Write};

use super::{Request, RequestType, Response, Status};
use crate::error::{Result, TxnError};
use crate::types::{Key, TransactionId, WriteRequest};

/// Header size: 1 byte op/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

// =============================================================================
// Request Encoding/Decoding
// =============================================================================

/// Encode a request to bytes
///
/// Format: op (1) + payload_len (4) + payload
pub fn encode_request(request: &Request) -> Result<Vec<u8>> {
    let op = request.request_type() as u8;

    let payload = match request {
        Request::Write(req) | Request::Commit(req) | Request::Abort(req) => {
            bincode::serialize(req)?
        }
        Request::Read { key, reader } | Request::ReleaseLock { key, reader } => {
            bincode::serialize(&(key, reader))?
        }
        Request::ReadPrevious {
            key,
            transaction_id,
        }
        | Request::ReadHistory {
            key,
            transaction_id,
        } => bincode::serialize(&(key, transaction_id))?,
        Request::Ping => Vec::new(),
    };
    check_payload_len(payload.len(), "request")?;

    Ok(frame(op, &payload))
}

/// Decode a request from bytes
pub fn decode_request(bytes: &[u8]) -> Result<Request> {
    let (op, payload) = split_frame(bytes, "request")?;

    let request_type = RequestType::from_u8(op)
        .ok_or_else(|| TxnError::Protocol(format!("Unknown request type: 0x{:02x}", op)))?;

    match request_type {
        RequestType::Write => Ok(Request::Write(decode_payload::<WriteRequest>(payload, "WRITE")?)),
        RequestType::Commit => Ok(Request::Commit(decode_payload(payload, "COMMIT")?)),
        RequestType::Abort => Ok(Request::Abort(decode_payload(payload, "ABORT")?)),
        RequestType::Read => {
            let (key, reader) = decode_payload::<(Key, TransactionId)>(payload, "READ")?;
            Ok(Request::Read { key, reader })
        }
        RequestType::ReleaseLock => {
            let (key, reader) = decode_payload::<(Key, TransactionId)>(payload, "RELEASE_LOCK")?;
            Ok(Request::ReleaseLock { key, reader })
        }
        RequestType::ReadPrevious => {
            let (key, transaction_id) =
                decode_payload::<(Key, TransactionId)>(payload, "READ_PREVIOUS")?;
            Ok(Request::ReadPrevious {
                key,
                transaction_id,
            })
        }
        RequestType::ReadHistory => {
            let (key, transaction_id) =
                decode_payload::<(Key, TransactionId)>(payload, "READ_HISTORY")?;
            Ok(Request::ReadHistory {
                key,
                transaction_id,
            })
        }
        RequestType::Ping => {
            if !payload.is_empty() {
                return Err(TxnError::Protocol(format!(
                    "PING request: unexpected payload of {} bytes",
                    payload.len()
                )));
            }
            Ok(Request::Ping)
        }
    }
}

/// Deserialize an operation payload, tagging failures with the op name
fn decode_payload<T: serde::de::DeserializeOwned>(payload: &[u8], op: &str) -> Result<T> {
    bincode::deserialize(payload)
        .map_err(|e| TxnError::Protocol(format!("{} request: malformed payload: {}", op, e)))
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: status (1) + payload_len (4) + payload
pub fn encode_response(response: &Response) -> Vec<u8> {
    frame(response.status as u8, &response.payload)
}

/// Decode a response from bytes
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (status_byte, payload) = split_frame(bytes, "response")?;

    let status = match status_byte {
        0x00 => Status::Ok,
        0x02 => Status::Error,
        _ => {
            return Err(TxnError::Protocol(format!(
                "Unknown response status: 0x{:02x}",
                status_byte
            )))
        }
    };

    Ok(Response {
        status,
        payload: payload.to_vec(),
    })
}

// =============================================================================
// Framing
// =============================================================================

/// Callers keep `payload` within `MAX_PAYLOAD_SIZE`
fn frame(tag: u8, payload: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(HEADER_SIZE + payload.len());
    message.push(tag);
    message.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    message.extend_from_slice(payload);
    message
}

/// Validate a complete frame and split it into tag and payload
fn split_frame<'a>(bytes: &'a [u8], what: &str) -> Result<(u8, &'a [u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(TxnError::Protocol(format!(
            "Incomplete {} header: expected {} bytes, got {}",
            what,
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let payload_len = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize;
    check_payload_len(payload_len, what)?;

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(TxnError::Protocol(format!(
            "Incomplete {} payload: expected {} bytes, got {}",
            what,
            total_len,
            bytes.len()
        )));
    }

    Ok((bytes[0], &bytes[HEADER_SIZE..total_len]))
}

fn check_payload_len(payload_len: usize, what: &str) -> Result<()> {
    if payload_len > MAX_PAYLOAD_SIZE as usize {
        return Err(TxnError::Protocol(format!(
            "{} payload too large: {} bytes (max {})",
            what, payload_len, MAX_PAYLOAD_SIZE
        )));
    }
    Ok(())
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one complete frame (header + payload) from a stream
fn read_frame<R: Read>(reader: &mut R, what: &str) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;
    check_payload_len(payload_len, what)?;

    let mut message = vec![0u8; HEADER_SIZE + payload_len];
    message[..HEADER_SIZE].copy_from_slice(&header);
    if payload_len > 0 {
        reader.read_exact(&mut message[HEADER_SIZE..])?;
    }

    Ok(message)
}

/// Read a complete request from a stream
///
/// Blocks until a complete request is received or an error occurs
pub fn read_request<R: Read>(reader: &mut R) -> Result<Request> {
    let message = read_frame(reader, "request")?;
    decode_request(&message)
}

/// Write a request to a stream
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> Result<()> {
    let bytes = encode_request(request)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let message = read_frame(reader, "response")?;
    decode_response(&message)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let bytes = encode_response(response);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
