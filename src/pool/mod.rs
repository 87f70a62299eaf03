//! Connection pooling contract and the built-in TCP pool
//!
//! This module provides:
//! - The narrow pool contract the service core drives (get/put/close)
//! - A pooled connection handle that stays attributable to its host
//! - A concrete TCP-backed pool with idle reuse and dial timeouts

pub mod tcp;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::host::Host;

pub use tcp::TcpPool;

/// Error types for pool operations
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("Pool is closed")]
    Closed,

    #[error("Pool is exhausted (limit: {limit})")]
    Exhausted { limit: u32 },

    #[error("Failed to connect: {0}")]
    ConnectionFailed(String),

    #[error("Connection timed out")]
    Timeout,

    #[error("Pool is draining ({active} connections still active)")]
    Draining { active: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Byte stream backing a pooled connection
pub trait ConnStream: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> ConnStream for T {}

/// A pooled connection handle
///
/// Carries a backreference to the host it was acquired from, so a release
/// or failure can be rated against the right backend.
pub struct Conn {
    stream: Box<dyn ConnStream>,
    host: Option<Arc<Host>>,
    created_at: Instant,
    last_used: Instant,
}

impl Conn {
    pub fn new(stream: Box<dyn ConnStream>) -> Self {
        let now = Instant::now();
        Self {
            stream,
            host: None,
            created_at: now,
            last_used: now,
        }
    }

    /// Bind this connection to the host it was acquired from
    pub(crate) fn set_host(&mut self, host: Arc<Host>) {
        self.host = Some(host);
    }

    /// Drop the host binding when the connection goes back to the idle set
    pub(crate) fn clear_host(&mut self) {
        self.host = None;
    }

    /// Reset the idle clock, marking the connection as just handled
    pub(crate) fn touch(&mut self) {
        self.last_used = Instant::now();
    }

    /// The host this connection is attributed to, if bound
    pub fn host(&self) -> Option<&Arc<Host>> {
        self.host.as_ref()
    }

    /// Mutable access to the underlying byte stream
    pub fn stream_mut(&mut self) -> &mut dyn ConnStream {
        self.last_used = Instant::now();
        &mut self.stream
    }

    /// Age of the connection since it was established
    pub fn age(&self) -> std::time::Duration {
        self.created_at.elapsed()
    }

    /// Time since the stream was last touched
    pub fn idle_for(&self) -> std::time::Duration {
        self.last_used.elapsed()
    }
}

impl std::fmt::Debug for Conn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conn")
            .field("host", &self.host.as_ref().map(|h| h.addr()))
            .field("age", &self.age())
            .finish()
    }
}

/// Contract a per-host connection pool must fulfill for the service core
///
/// `force_close` must be idempotent: forcing an already-closed pool is a
/// successful no-op. `close` is graceful and may fail with
/// [`PoolError::Draining`] while connections are still checked out; once the
/// pool has drained, `close` succeeds and stays successful on repeat calls.
#[async_trait]
pub trait ConnectionPool: Send + Sync {
    /// Acquire a connection, reusing an idle one when possible
    async fn get(&self) -> Result<Conn, PoolError>;

    /// Return a connection for reuse
    async fn put(&self, conn: Conn);

    /// Account for a connection that will not be returned (broken stream)
    async fn discard(&self, conn: Conn);

    /// Gracefully close the pool
    async fn close(&self) -> Result<(), PoolError>;

    /// Tear the pool down immediately, dropping all connections
    async fn force_close(&self) -> Result<(), PoolError>;

    /// Number of connections currently checked out
    async fn active_conns(&self) -> u32;

    /// Address this pool dials
    fn addr(&self) -> &str;
}
