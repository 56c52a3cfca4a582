//! Protocol Module
//!
//! Defines the wire protocol between transaction coordinators and servers.
//!
//! ## Protocol Format (V1 - Framed Binary)
//!
//! ### Request Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Op (1)   │ Len (4)  │    Payload (bincode)        │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Operations
//! - 0x01: WRITE          - Payload: WriteRequest
//! - 0x02: COMMIT         - Payload: WriteRequest
//! - 0x03: ABORT          - Payload: WriteRequest
//! - 0x04: READ           - Payload: key + reader id
//! - 0x05: READ_PREVIOUS  - Payload: key + transaction id
//! - 0x06: READ_HISTORY   - Payload: key + transaction id
//! - 0x07: RELEASE_LOCK   - Payload: key + reader id
//! - 0x08: PING           - Payload: empty
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Status Codes
//! - 0x00: OK    - Payload: Reply (bincode)
//! - 0x02: ERROR - Payload: UTF-8 message

mod request;
mod reply;
mod codec;

pub use request::{Request, RequestType};
pub use reply::{Reply, Response, Status};
pub use codec::{
    decode_request, decode_response, encode_request, encode_response, read_request,
    read_response, write_request, write_response, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
