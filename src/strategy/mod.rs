//! Pluggable host selection strategies

pub mod bandit;
pub mod round_robin;

use std::sync::Arc;

use crate::host::Host;

pub use bandit::{EpsilonGreedy, Softmax};
pub use round_robin::RoundRobin;

/// A selection strategy picks one host out of the current candidates
///
/// `select` returns `None` only for an empty candidate slice. Strategies
/// that consume scores report it through `requires_scores`, so the service
/// can skip score computation entirely for label-only strategies.
pub trait Selecter: Send + Sync {
    /// Pick exactly one host from the candidates
    fn select<'a>(&self, hosts: &'a [Arc<Host>]) -> Option<&'a Arc<Host>>;

    /// Whether candidate scores must be recomputed before `select`
    fn requires_scores(&self) -> bool {
        true
    }
}
