//! Network Module
//!
//! TCP server and client connection handling.
//!
//! ## Architecture
//! - Single acceptor thread (non-blocking accept, polls the shutdown flag)
//! - One thread per connection, capped by `max_connections`
//! - Requests routed through `Node`

mod server;
mod connection;

pub use server::Server;
pub use connection::Connection;
