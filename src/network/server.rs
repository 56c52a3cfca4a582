//! TCP Server
//!
//! Accepts connections and hands each to its own thread.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::Connection;
use crate::config::Config;
use crate::error::{Result, TxnError};
use crate::node::Node;

/// How long the acceptor sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// TCP server for one ramptxn node
pub struct Server {
    config: Config,
    node: Arc<Node>,
    listener: Option<TcpListener>,
    shutdown: Arc<AtomicBool>,
    active_connections: Arc<AtomicUsize>,
}

impl Server {
    /// Create a new server with the given config and node
    pub fn new(config: Config, node: Arc<Node>) -> Self {
        Self {
            config,
            node,
            listener: None,
            shutdown: Arc::new(AtomicBool::new(false)),
            active_connections: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Bind the listen address without serving yet
    ///
    /// Returns the bound address (useful with port 0).
    pub fn bind(&mut self) -> Result<SocketAddr> {
        let listener = TcpListener::bind(&self.config.listen_addr).map_err(|e| {
            TxnError::Network(format!("bind {} failed: {}", self.config.listen_addr, e))
        })?;
        listener.set_nonblocking(true)?;
        let addr = listener.local_addr()?;
        self.listener = Some(listener);
        Ok(addr)
    }

    /// Start the server (blocking until shutdown)
    pub fn run(&mut self) -> Result<()> {
        if self.listener.is_none() {
            self.bind()?;
        }
        let listener = self
            .listener
            .take()
            .ok_or_else(|| TxnError::Network("listener not bound".to_string()))?;

        tracing::info!("Listening on {}", listener.local_addr()?);

        while !self.shutdown.load(Ordering::Relaxed) {
            match listener.accept() {
                Ok((stream, peer)) => {
                    // Accepted sockets inherit non-blocking mode on some platforms
                    stream.set_nonblocking(false)?;

                    if self.active_connections.load(Ordering::Relaxed)
                        >= self.config.max_connections
                    {
                        tracing::warn!("Rejecting {}: connection limit reached", peer);
                        drop(stream);
                        continue;
                    }

                    self.spawn_connection(stream);
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                }
            }
        }

        tracing::info!("Server shut down");
        Ok(())
    }

    fn spawn_connection(&self, stream: std::net::TcpStream) {
        let node = Arc::clone(&self.node);
        let active = Arc::clone(&self.active_connections);
        let (read_ms, write_ms) = (self.config.read_timeout_ms, self.config.write_timeout_ms);

        active.fetch_add(1, Ordering::Relaxed);
        thread::spawn(move || {
            let result = Connection::new(stream, node).and_then(|mut conn| {
                conn.set_timeouts(read_ms, write_ms)?;
                conn.handle()
            });
            if let Err(e) = result {
                tracing::debug!("Connection ended with error: {}", e);
            }
            active.fetch_sub(1, Ordering::Relaxed);
        });
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Flag that stops `run` when set; usable from another thread
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Number of connections currently being served
    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }
}
