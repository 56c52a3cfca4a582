//! TCP transport
//!
//! Speaks the framed protocol to one server per key shard, keeping a small
//! pool of idle connections per server.

use std::io::{BufReader, BufWriter};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use parking_lot::Mutex;

use super::{Router, Transport};
use crate::config::ClientConfig;
use crate::error::{Result, TxnError};
use crate::protocol::{read_response, write_request, Reply, Request};

/// Idle connections kept per server
const MAX_IDLE_PER_SERVER: usize = 32;

/// One request/response connection to a server
struct PooledConnection {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl PooledConnection {
    fn open(addr: &SocketAddr, connect_timeout: Duration, io_timeout: Option<Duration>) -> Result<Self> {
        let stream = TcpStream::connect_timeout(addr, connect_timeout)
            .map_err(|e| TxnError::Network(format!("connect to {} failed: {}", addr, e)))?;
        stream.set_nodelay(true)?;
        stream.set_read_timeout(io_timeout)?;
        stream.set_write_timeout(io_timeout)?;

        Ok(Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
        })
    }

    fn round_trip(&mut self, request: &Request) -> Result<Reply> {
        write_request(&mut self.writer, request)?;
        read_response(&mut self.reader)?.into_reply()
    }
}

/// Connection pool for one server
struct ServerPool {
    addr: SocketAddr,
    idle: Mutex<Vec<PooledConnection>>,
}

/// Transport over TCP
pub struct TcpTransport {
    servers: Vec<ServerPool>,
    router: Router,
    connect_timeout: Duration,
    io_timeout: Option<Duration>,
}

impl TcpTransport {
    /// Resolve the configured server addresses
    ///
    /// Connections are opened lazily on first use.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut servers = Vec::with_capacity(config.server_addrs.len());
        for addr in &config.server_addrs {
            let resolved = addr
                .to_socket_addrs()
                .map_err(|e| TxnError::Config(format!("bad server address {}: {}", addr, e)))?
                .next()
                .ok_or_else(|| TxnError::Config(format!("server address {} did not resolve", addr)))?;
            servers.push(ServerPool {
                addr: resolved,
                idle: Mutex::new(Vec::new()),
            });
        }

        let io_timeout = match config.io_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };

        Ok(Self {
            router: Router::new(servers.len())?,
            servers,
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            io_timeout,
        })
    }

    fn send_to(&self, server: &ServerPool, request: &Request) -> Result<Reply> {
        let pooled = server.idle.lock().pop();
        let mut conn = match pooled {
            Some(conn) => conn,
            None => PooledConnection::open(&server.addr, self.connect_timeout, self.io_timeout)?,
        };

        // A failed connection is dropped, never returned to the pool
        let reply = conn.round_trip(request)?;

        let mut idle = server.idle.lock();
        if idle.len() < MAX_IDLE_PER_SERVER {
            idle.push(conn);
        }
        Ok(reply)
    }
}

impl Transport for TcpTransport {
    fn call(&self, request: Request) -> Result<Reply> {
        let index = request.key().map(|k| self.router.route(k)).unwrap_or(0);
        let server = &self.servers[index];
        tracing::trace!("-> {} {:?}", server.addr, request.request_type());
        self.send_to(server, &request)
    }
}
