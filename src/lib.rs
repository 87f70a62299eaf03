//! poolmux - Client-side load balancer over per-host connection pools
//!
//! poolmux gives callers a single logical service handle in front of a
//! dynamic set of backend hosts. Each host owns its own connection pool and
//! a time-bounded statistics window; a background decay task ages every
//! window on a shared clock so host scores stay comparable. Connection
//! acquisition snapshots the live hosts, asks a pluggable strategy to pick
//! one, and demotes-and-retries when the chosen pool fails.
//!
//! ## Core pieces
//!
//! - **Service**: the host registry, decay loop, and acquisition entry point
//! - **Host**: one backend address, its pool, and its scoring window
//! - **Strategies**: label-only round-robin (default) plus score-driven
//!   bandits (epsilon-greedy, softmax)
//! - **Pools**: anything implementing [`pool::ConnectionPool`]; a TCP pool
//!   ships in the crate
//!
//! ## Usage
//!
//! ```rust,no_run
//! use poolmux::{Service, ServiceConfig};
//! use poolmux::host::HostStatus;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = Service::new("cache", ServiceConfig::default());
//!     service.add_host("10.0.0.1:11211").await;
//!     service.add_host("10.0.0.2:11211").await;
//!
//!     let conn = service.get_conn().await?;
//!     // ... use conn.stream_mut() ...
//!     service.release(conn, HostStatus::Up).await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod host;
pub mod pool;
pub mod service;
pub mod strategy;

// Re-export commonly used types
pub use config::{PoolSettings, ServiceSettings};
pub use host::{Computer, Host, HostStatus, Identity, Serie};
pub use pool::{Conn, ConnectionPool, PoolError, TcpPool};
pub use service::{PoolFactory, Service, ServiceConfig, ServiceError};
pub use strategy::{EpsilonGreedy, RoundRobin, Selecter, Softmax};
