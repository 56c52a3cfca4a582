//! Configuration for ramptxn
//!
//! Centralized configuration with sensible defaults, for both the server
//! process and the transaction client.

use std::time::Duration;

use crate::error::{Result, TxnError};
use crate::txn_id::MAX_CLIENT_ID;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 = none)
    ///
    /// Coordinators keep pooled connections idle between transactions, so
    /// the default is no timeout.
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:7400".to_string(),
            max_connections: 1024,
            read_timeout_ms: 0,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Retry behaviour for lock contention and transport failures
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// First sleep after a `LockWaitAbort`
    pub initial_backoff: Duration,

    /// Backoff doubles per attempt up to this cap
    pub max_backoff: Duration,

    /// Give up on a key's write lock after this long (`None` = never)
    pub lock_wait_timeout: Option<Duration>,

    /// Extra attempts for an RPC that failed in transport
    pub rpc_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_micros(200),
            max_backoff: Duration::from_millis(50),
            lock_wait_timeout: Some(Duration::from_secs(10)),
            rpc_retries: 3,
        }
    }
}

impl RetryPolicy {
    /// Next backoff after `current`
    pub fn next_backoff(&self, current: Duration) -> Duration {
        std::cmp::min(current * 2, self.max_backoff)
    }
}

/// Client (transaction coordinator) configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Deployment-unique id, prefixed onto every transaction id
    pub client_id: u32,

    /// Server addresses; keys are routed across them by hash
    pub server_addrs: Vec<String>,

    /// Retry behaviour
    pub retry: RetryPolicy,

    /// TCP connect timeout (milliseconds)
    pub connect_timeout_ms: u64,

    /// Per-RPC read/write timeout (milliseconds, 0 = none)
    pub io_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_id: 1,
            server_addrs: vec!["127.0.0.1:7400".to_string()],
            retry: RetryPolicy::default(),
            connect_timeout_ms: 2000,
            io_timeout_ms: 5000,
        }
    }
}

impl ClientConfig {
    /// Create a new client config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Check the config is usable
    pub fn validate(&self) -> Result<()> {
        if self.server_addrs.is_empty() {
            return Err(TxnError::Config("no server addresses configured".to_string()));
        }
        if self.client_id > MAX_CLIENT_ID {
            return Err(TxnError::Config(format!(
                "client id {} exceeds maximum {}",
                self.client_id, MAX_CLIENT_ID
            )));
        }
        if self.retry.initial_backoff > self.retry.max_backoff {
            return Err(TxnError::Config(
                "initial backoff is larger than max backoff".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for ClientConfig
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the client id used to prefix transaction ids
    pub fn client_id(mut self, id: u32) -> Self {
        self.config.client_id = id;
        self
    }

    /// Replace the server address list
    pub fn server_addrs<I, S>(mut self, addrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.server_addrs = addrs.into_iter().map(Into::into).collect();
        self
    }

    /// Set the retry policy
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Set the lock-wait timeout (`None` retries forever)
    pub fn lock_wait_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.retry.lock_wait_timeout = timeout;
        self
    }

    /// Set the connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    /// Set the per-RPC I/O timeout (in milliseconds)
    pub fn io_timeout_ms(mut self, ms: u64) -> Self {
        self.config.io_timeout_ms = ms;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
