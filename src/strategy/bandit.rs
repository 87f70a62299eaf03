//! Score-driven bandit strategies balancing exploration and exploitation

use rand::Rng;
use std::sync::Arc;

use super::Selecter;
use crate::host::Host;

/// Epsilon-greedy bandit selection
///
/// With probability epsilon picks a uniformly random host (exploration),
/// otherwise the highest-scored host (exploitation).
#[derive(Debug, Clone, Copy)]
pub struct EpsilonGreedy {
    epsilon: f64,
}

impl EpsilonGreedy {
    /// Create a strategy with the given exploration rate, clamped to [0, 1]
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon: epsilon.clamp(0.0, 1.0),
        }
    }
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl Selecter for EpsilonGreedy {
    fn select<'a>(&self, hosts: &'a [Arc<Host>]) -> Option<&'a Arc<Host>> {
        if hosts.is_empty() {
            return None;
        }

        let mut rng = rand::thread_rng();
        if rng.gen::<f64>() < self.epsilon {
            return hosts.get(rng.gen_range(0..hosts.len()));
        }

        hosts.iter().max_by(|a, b| {
            a.score()
                .partial_cmp(&b.score())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }
}

/// Softmax (Boltzmann) bandit selection
///
/// Draws a host with probability proportional to `exp(score / temperature)`.
/// Higher temperatures flatten the distribution toward uniform choice.
#[derive(Debug, Clone, Copy)]
pub struct Softmax {
    temperature: f64,
}

impl Softmax {
    /// Create a strategy with the given temperature (floored at a small positive value)
    pub fn new(temperature: f64) -> Self {
        Self {
            temperature: temperature.max(1e-6),
        }
    }
}

impl Default for Softmax {
    fn default() -> Self {
        Self::new(0.2)
    }
}

impl Selecter for Softmax {
    fn select<'a>(&self, hosts: &'a [Arc<Host>]) -> Option<&'a Arc<Host>> {
        if hosts.is_empty() {
            return None;
        }

        // Subtract the max score before exponentiating to keep weights finite
        let max_score = hosts
            .iter()
            .map(|h| h.score())
            .fold(f64::NEG_INFINITY, f64::max);

        let weights: Vec<f64> = hosts
            .iter()
            .map(|h| ((h.score() - max_score) / self.temperature).exp())
            .collect();
        let total: f64 = weights.iter().sum();

        let mut draw = rand::thread_rng().gen::<f64>() * total;
        for (host, weight) in hosts.iter().zip(&weights) {
            draw -= weight;
            if draw <= 0.0 {
                return Some(host);
            }
        }

        // Floating point residue lands on the last candidate
        hosts.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostStatus, Identity};
    use crate::strategy::tests::make_hosts;

    #[test]
    fn test_greedy_picks_best_score() {
        let hosts = make_hosts(3);

        // Demote everything except the middle host
        hosts[0].rate(HostStatus::Down);
        hosts[2].rate(HostStatus::Down);
        hosts[1].rate(HostStatus::Up);
        for h in &hosts {
            h.compute_score(&Identity);
        }

        // epsilon = 0 is pure exploitation
        let strategy = EpsilonGreedy::new(0.0);
        for _ in 0..20 {
            assert_eq!(strategy.select(&hosts).unwrap().addr(), hosts[1].addr());
        }
    }

    #[test]
    fn test_greedy_explores() {
        let hosts = make_hosts(3);
        for h in &hosts {
            h.compute_score(&Identity);
        }

        // epsilon = 1 is pure exploration; every host should come up
        let strategy = EpsilonGreedy::new(1.0);
        let mut seen = [false; 3];
        for _ in 0..200 {
            let addr = strategy.select(&hosts).unwrap().addr();
            let idx = hosts.iter().position(|h| h.addr() == addr).unwrap();
            seen[idx] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_softmax_returns_a_candidate() {
        let hosts = make_hosts(5);
        for h in &hosts {
            h.compute_score(&Identity);
        }

        let strategy = Softmax::default();
        for _ in 0..100 {
            assert!(strategy.select(&hosts).is_some());
        }
    }

    #[test]
    fn test_softmax_favors_higher_scores() {
        let hosts = make_hosts(2);
        hosts[0].rate(HostStatus::Down);
        hosts[1].rate(HostStatus::Up);
        for h in &hosts {
            h.compute_score(&Identity);
        }

        // Cold temperature makes the choice effectively greedy
        let strategy = Softmax::new(0.01);
        let mut wins = 0;
        for _ in 0..100 {
            if strategy.select(&hosts).unwrap().addr() == hosts[1].addr() {
                wins += 1;
            }
        }
        assert!(wins > 90, "expected host 1 to dominate, won {}", wins);
    }

    #[test]
    fn test_empty_candidates() {
        assert!(EpsilonGreedy::default().select(&[]).is_none());
        assert!(Softmax::default().select(&[]).is_none());
    }

    #[test]
    fn test_bandits_require_scores() {
        assert!(EpsilonGreedy::default().requires_scores());
        assert!(Softmax::default().requires_scores());
    }
}
