//! TCP-backed connection pool with idle reuse and dial timeouts

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{Conn, ConnStream, ConnectionPool, PoolError};
use crate::config::PoolSettings;

/// Configuration for TCP pool behavior
#[derive(Debug, Clone)]
pub struct TcpPoolConfig {
    /// Maximum number of connections checked out at once
    pub max_conns: u32,

    /// Maximum number of idle connections kept for reuse
    pub max_idle_conns: usize,

    /// Dial timeout
    pub connect_timeout: Duration,

    /// Maximum idle time before a pooled connection is discarded
    pub max_idle_time: Duration,
}

impl Default for TcpPoolConfig {
    fn default() -> Self {
        Self {
            max_conns: 32,
            max_idle_conns: 8,
            connect_timeout: Duration::from_secs(5),
            max_idle_time: Duration::from_secs(90),
        }
    }
}

impl From<&PoolSettings> for TcpPoolConfig {
    fn from(settings: &PoolSettings) -> Self {
        Self {
            max_conns: settings.max_conns,
            max_idle_conns: settings.max_idle_conns,
            connect_timeout: settings.connect_timeout(),
            max_idle_time: settings.max_idle_time(),
        }
    }
}

struct Inner {
    idle: Vec<Conn>,
    active: u32,
    closed: bool,
}

/// TCP connection pool for a single backend address
pub struct TcpPool {
    addr: String,
    config: TcpPoolConfig,
    inner: Arc<Mutex<Inner>>,
}

impl TcpPool {
    pub fn new(addr: impl Into<String>, config: TcpPoolConfig) -> Self {
        Self {
            addr: addr.into(),
            config,
            inner: Arc::new(Mutex::new(Inner {
                idle: Vec::new(),
                active: 0,
                closed: false,
            })),
        }
    }

    /// Dial the backend with the configured timeout and TCP keep-alive
    async fn dial(&self) -> Result<Box<dyn ConnStream>, PoolError> {
        let stream = tokio::time::timeout(
            self.config.connect_timeout,
            TcpStream::connect(&self.addr),
        )
        .await
        .map_err(|_| PoolError::Timeout)?
        .map_err(|e| PoolError::ConnectionFailed(e.to_string()))?;

        let socket = socket2::Socket::from(stream.into_std()?);
        socket.set_keepalive(true)?;
        let stream = TcpStream::from_std(socket.into())?;

        debug!(backend = %self.addr, "Dialed new connection");
        Ok(Box::new(stream))
    }
}

#[async_trait]
impl ConnectionPool for TcpPool {
    async fn get(&self) -> Result<Conn, PoolError> {
        // Reserve the slot under the lock; dial outside it
        {
            let mut inner = self.inner.lock().await;
            if inner.closed {
                return Err(PoolError::Closed);
            }
            if inner.active >= self.config.max_conns {
                return Err(PoolError::Exhausted {
                    limit: self.config.max_conns,
                });
            }
            inner.active += 1;

            // Reuse the freshest idle connection that hasn't aged out
            while let Some(conn) = inner.idle.pop() {
                if conn.idle_for() < self.config.max_idle_time {
                    debug!(
                        backend = %self.addr,
                        idle_ms = conn.idle_for().as_millis() as u64,
                        age_secs = conn.age().as_secs(),
                        "Reusing idle connection"
                    );
                    return Ok(conn);
                }
                debug!(backend = %self.addr, "Discarding stale idle connection");
            }
        }

        match self.dial().await {
            Ok(stream) => Ok(Conn::new(stream)),
            Err(e) => {
                let mut inner = self.inner.lock().await;
                inner.active = inner.active.saturating_sub(1);
                warn!(backend = %self.addr, error = %e, "Connection attempt failed");
                Err(e)
            }
        }
    }

    async fn put(&self, mut conn: Conn) {
        let mut inner = self.inner.lock().await;
        inner.active = inner.active.saturating_sub(1);

        if inner.closed {
            return;
        }
        if inner.idle.len() < self.config.max_idle_conns {
            conn.clear_host();
            conn.touch();
            inner.idle.push(conn);
        }
    }

    async fn discard(&self, conn: Conn) {
        let mut inner = self.inner.lock().await;
        inner.active = inner.active.saturating_sub(1);
        drop(conn);
    }

    async fn close(&self) -> Result<(), PoolError> {
        let mut inner = self.inner.lock().await;
        inner.idle.clear();

        if inner.active > 0 {
            return Err(PoolError::Draining {
                active: inner.active,
            });
        }

        if !inner.closed {
            inner.closed = true;
            info!(backend = %self.addr, "Pool closed");
        }
        Ok(())
    }

    async fn force_close(&self) -> Result<(), PoolError> {
        let mut inner = self.inner.lock().await;
        if !inner.closed {
            let dropped = inner.active;
            inner.idle.clear();
            inner.active = 0;
            inner.closed = true;
            info!(backend = %self.addr, dropped = dropped, "Pool force-closed");
        }
        Ok(())
    }

    async fn active_conns(&self) -> u32 {
        self.inner.lock().await.active
    }

    fn addr(&self) -> &str {
        &self.addr
    }
}
