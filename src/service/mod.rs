//! Host registry, decay loop, and connection acquisition
//!
//! A [`Service`] owns the map of live hosts for one logical backend service.
//! A background task ages every host's statistics window on a fixed period,
//! foreground calls snapshot the registry to select a host, and acquisition
//! failures demote the failing host before retrying.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

use crate::config::ServiceSettings;
use crate::host::{Computer, Host, HostStatus, Identity};
use crate::pool::{Conn, ConnectionPool, TcpPool};
use crate::pool::tcp::TcpPoolConfig;
use crate::strategy::{EpsilonGreedy, RoundRobin, Selecter, Softmax};

/// Error types for service operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("No host available")]
    NoHostAvailable,
}

/// Builds a connection pool for a newly registered host address
pub type PoolFactory = Arc<dyn Fn(&str) -> Arc<dyn ConnectionPool> + Send + Sync>;

/// Runtime configuration for a [`Service`]
///
/// Immutable after construction. [`Default`] wires a round-robin strategy,
/// a passthrough score function, and TCP pools with default settings.
#[derive(Clone)]
pub struct ServiceConfig {
    /// Number of series buckets retained per host
    pub series_num: usize,

    /// Grace period before a forced pool close
    pub close_deadline: Duration,

    /// Decay tick period
    pub decay_interval: Duration,

    /// Maximum connection acquisition attempts per call
    pub max_attempts: u32,

    /// Host selection strategy
    pub strategy: Arc<dyn Selecter>,

    /// Score function applied at selection time
    pub calculator: Arc<dyn Computer>,

    /// Pool constructor invoked on host registration
    pub pool_factory: PoolFactory,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from_settings(&ServiceSettings::default())
    }
}

impl ServiceConfig {
    /// Build a runtime configuration from loaded settings
    pub fn from_settings(settings: &ServiceSettings) -> Self {
        let strategy: Arc<dyn Selecter> = match settings.strategy.as_str() {
            "epsilon_greedy" => Arc::new(EpsilonGreedy::default()),
            "softmax" => Arc::new(Softmax::default()),
            _ => Arc::new(RoundRobin::new()),
        };

        let pool_config = TcpPoolConfig::from(&settings.pool);
        let pool_factory: PoolFactory = Arc::new(move |addr: &str| {
            Arc::new(TcpPool::new(addr, pool_config.clone())) as Arc<dyn ConnectionPool>
        });

        Self {
            series_num: settings.series_num,
            close_deadline: settings.close_deadline(),
            decay_interval: settings.decay_interval(),
            max_attempts: settings.max_attempts,
            strategy,
            calculator: Arc::new(Identity),
            pool_factory,
        }
    }
}

type Registry = Arc<RwLock<HashMap<String, Arc<Host>>>>;

/// Client-side load balancer for one logical backend service
pub struct Service {
    name: String,
    config: ServiceConfig,
    hosts: Registry,
    shutdown: watch::Sender<bool>,
}

impl Service {
    /// Create a service and start its decay loop
    pub fn new(name: impl Into<String>, config: ServiceConfig) -> Self {
        let name = name.into();
        let hosts: Registry = Arc::new(RwLock::new(HashMap::new()));
        let (shutdown, shutdown_rx) = watch::channel(false);

        Self::start_decay_task(
            name.clone(),
            Arc::clone(&hosts),
            config.series_num,
            config.decay_interval,
            shutdown_rx,
        );

        Self {
            name,
            config,
            hosts,
            shutdown,
        }
    }

    /// Background task aging every host's window each tick
    fn start_decay_task(
        name: String,
        hosts: Registry,
        series_num: usize,
        interval: Duration,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; swallow it so windows
            // only grow on real period boundaries
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let registry = hosts.write().await;
                        for host in registry.values() {
                            host.shift(series_num);
                        }
                        debug!(service = %name, hosts = registry.len(), "Decay tick");
                    }
                    _ = shutdown_rx.changed() => {
                        debug!(service = %name, "Decay loop stopped");
                        break;
                    }
                }
            }
        });
    }

    /// Stop the decay loop. Idempotent; also triggered on drop
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Register a host. No-op when the address is already present
    pub async fn add_host(&self, addr: &str) {
        let mut registry = self.hosts.write().await;
        if registry.contains_key(addr) {
            return;
        }

        let pool = (self.config.pool_factory)(addr);
        let host = Arc::new(Host::new(addr, pool, self.config.series_num));
        registry.insert(addr.to_string(), host);
        info!(service = %self.name, host = %addr, "Host registered");
    }

    /// Deregister a host and close its pool in the background
    ///
    /// The pool close is two-phase: a graceful close is attempted first,
    /// and if it fails a forced close happens once `close_deadline` has
    /// elapsed, unless the pool drained in the meantime.
    pub async fn remove_host(&self, addr: &str) {
        let host = {
            let mut registry = self.hosts.write().await;
            match registry.remove(addr) {
                Some(host) => host,
                None => return,
            }
        };
        info!(service = %self.name, host = %addr, "Host deregistered");

        let deadline = self.config.close_deadline;
        let service = self.name.clone();
        tokio::spawn(async move {
            let pool = host.pool();
            if let Err(e) = pool.close().await {
                warn!(
                    service = %service,
                    host = %host.addr(),
                    error = %e,
                    deadline_ms = deadline.as_millis() as u64,
                    "Graceful pool close failed, forced close scheduled"
                );
                tokio::time::sleep(deadline).await;

                // The pool may have drained during the grace period;
                // prefer a clean close over a forced one
                if let Err(e) = pool.close().await {
                    warn!(service = %service, host = %host.addr(), error = %e, "Forcing pool close");
                    let _ = pool.force_close().await;
                }
            }
        });
    }

    /// Acquire a connection from one of the registered hosts
    ///
    /// Candidates are snapshotted under a shared lock, scored when the
    /// strategy consumes scores, and one host is selected per attempt. A
    /// host whose pool fails to yield a connection is demoted and the
    /// operation retries, up to `max_attempts` times.
    pub async fn get_conn(&self) -> Result<Conn, ServiceError> {
        for attempt in 0..self.config.max_attempts {
            let candidates: Vec<Arc<Host>> = {
                let registry = self.hosts.read().await;
                let candidates: Vec<Arc<Host>> = registry.values().cloned().collect();

                // Label-only strategies never consume scores; skip the
                // recomputation entirely
                if self.config.strategy.requires_scores() {
                    for host in &candidates {
                        host.compute_score(self.config.calculator.as_ref());
                    }
                }
                candidates
            };

            if candidates.is_empty() {
                return Err(ServiceError::NoHostAvailable);
            }

            let Some(host) = self.config.strategy.select(&candidates) else {
                return Err(ServiceError::NoHostAvailable);
            };
            let host = Arc::clone(host);

            // Pool I/O happens outside the registry lock
            match host.pool().get().await {
                Ok(mut conn) => {
                    conn.set_host(Arc::clone(&host));
                    return Ok(conn);
                }
                Err(e) => {
                    debug!(
                        service = %self.name,
                        host = %host.addr(),
                        attempt = attempt + 1,
                        error = %e,
                        "Acquisition failed, demoting host"
                    );
                    host.rate(HostStatus::Down);
                }
            }
        }

        warn!(
            service = %self.name,
            attempts = self.config.max_attempts,
            "Acquisition attempts exhausted"
        );
        Err(ServiceError::NoHostAvailable)
    }

    /// Rate the connection's host and hand the connection back to its pool
    ///
    /// An `Up` release returns the connection for reuse; a `Down` release
    /// discards it. Connections without a host binding are dropped.
    pub async fn release(&self, conn: Conn, status: HostStatus) {
        let Some(host) = conn.host().cloned() else {
            return;
        };
        host.rate(status);

        match status {
            HostStatus::Up => host.pool().put(conn).await,
            HostStatus::Down => host.pool().discard(conn).await,
        }
    }

    /// Active connection count per registered host
    pub async fn status(&self) -> HashMap<String, u32> {
        let registry = self.hosts.read().await;
        let mut counts = HashMap::with_capacity(registry.len());
        for (addr, host) in registry.iter() {
            counts.insert(addr.clone(), host.pool().active_conns().await);
        }
        counts
    }

    /// Snapshot of the currently registered hosts
    pub async fn hosts(&self) -> Vec<Arc<Host>> {
        self.hosts.read().await.values().cloned().collect()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for Service {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}
