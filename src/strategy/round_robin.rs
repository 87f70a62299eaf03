use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::Selecter;
use crate::host::Host;

/// Label-only rotation over the candidate list, the default strategy
///
/// Ignores host scores entirely; the service skips score computation when
/// this strategy is configured.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Selecter for RoundRobin {
    fn select<'a>(&self, hosts: &'a [Arc<Host>]) -> Option<&'a Arc<Host>> {
        if hosts.is_empty() {
            return None;
        }
        let index = self.counter.fetch_add(1, Ordering::Relaxed) % hosts.len();
        hosts.get(index)
    }

    fn requires_scores(&self) -> bool {
        false
    }
}
