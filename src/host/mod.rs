//! Per-backend host state: owned pool, statistics window, score

pub mod serie;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::pool::ConnectionPool;

pub use serie::Serie;

/// Immediate rating signal for a host outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStatus {
    /// The host served a connection successfully
    Up,
    /// The host failed to yield a usable connection
    Down,
}

impl HostStatus {
    /// Reward weight recorded into the current statistics bucket
    pub fn reward(self) -> f64 {
        match self {
            HostStatus::Up => 1.0,
            HostStatus::Down => 0.0,
        }
    }
}

/// Score function mapping a host's aggregated window value to a score
///
/// The raw input is the mean reward over the host's retained window,
/// in [0, 1]. Implementations may rescale, smooth, or bias it.
pub trait Computer: Send + Sync {
    fn compute(&self, raw: f64) -> f64;
}

/// Passthrough score function, the default
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Computer for Identity {
    fn compute(&self, raw: f64) -> f64 {
        raw
    }
}

// Hosts with an empty window score optimistically so new backends
// attract traffic from score-driven strategies.
const EMPTY_WINDOW_RAW: f64 = 1.0;

/// A registered backend: one owned connection pool plus its decay window
pub struct Host {
    addr: String,
    pool: Arc<dyn ConnectionPool>,
    series: Mutex<VecDeque<Serie>>,
    // f64 bits, written at score computation time
    score: AtomicU64,
}

impl Host {
    /// Create a host with a window seeded with one empty bucket
    pub fn new(addr: impl Into<String>, pool: Arc<dyn ConnectionPool>, capacity: usize) -> Self {
        let mut series = VecDeque::with_capacity(capacity);
        series.push_back(Serie::new());
        Self {
            addr: addr.into(),
            pool,
            series: Mutex::new(series),
            score: AtomicU64::new(EMPTY_WINDOW_RAW.to_bits()),
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn pool(&self) -> &Arc<dyn ConnectionPool> {
        &self.pool
    }

    /// Age the window: append a fresh bucket, drop the oldest beyond capacity
    pub fn shift(&self, capacity: usize) {
        let mut series = self.series.lock().unwrap_or_else(|e| e.into_inner());
        series.push_back(Serie::new());
        while series.len() > capacity {
            series.pop_front();
        }
    }

    /// Record an outcome into the newest bucket
    pub fn rate(&self, status: HostStatus) {
        let mut series = self.series.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(current) = series.back_mut() {
            current.observe(status.reward());
        }
        if status == HostStatus::Down {
            debug!(host = %self.addr, "Host demoted");
        }
    }

    /// Recompute the score from the retained window through the score function
    pub fn compute_score(&self, calculator: &dyn Computer) -> f64 {
        let raw = {
            let series = self.series.lock().unwrap_or_else(|e| e.into_inner());
            let trials: u32 = series.iter().map(|s| s.trials()).sum();
            if trials == 0 {
                EMPTY_WINDOW_RAW
            } else {
                let rewards: f64 = series.iter().map(|s| s.rewards()).sum();
                rewards / trials as f64
            }
        };

        let score = calculator.compute(raw);
        self.score.store(score.to_bits(), Ordering::Relaxed);
        score
    }

    /// Last computed score
    pub fn score(&self) -> f64 {
        f64::from_bits(self.score.load(Ordering::Relaxed))
    }

    /// Number of buckets currently retained
    pub fn window_len(&self) -> usize {
        self.series.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("addr", &self.addr)
            .field("score", &self.score())
            .field("window_len", &self.window_len())
            .finish()
    }
}
