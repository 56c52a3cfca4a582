//! Key routing
//!
//! Maps each key to the index of the server that owns it.

use crate::error::{Result, TxnError};

/// Hash-mod router over a fixed server list
///
/// Uses CRC32 so that every client process, whatever its build, routes a
/// key to the same server.
#[derive(Debug, Clone, Copy)]
pub struct Router {
    server_count: usize,
}

impl Router {
    pub fn new(server_count: usize) -> Result<Self> {
        if server_count == 0 {
            return Err(TxnError::Config("router needs at least one server".to_string()));
        }
        Ok(Self { server_count })
    }

    /// Index of the server owning `key`
    pub fn route(&self, key: &[u8]) -> usize {
        crc32fast::hash(key) as usize % self.server_count
    }
}
