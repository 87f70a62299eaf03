/// One accumulation bucket of host statistics
///
/// A serie collects rated outcomes for a single decay period. Only the
/// newest bucket in a host's window is written to; older buckets are
/// read-only until they rotate out.
#[derive(Debug, Clone, Copy, Default)]
pub struct Serie {
    trials: u32,
    rewards: f64,
}

impl Serie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one rated outcome with the given reward weight
    pub fn observe(&mut self, reward: f64) {
        self.trials += 1;
        self.rewards += reward;
    }

    /// Number of outcomes recorded in this bucket
    pub fn trials(&self) -> u32 {
        self.trials
    }

    /// Sum of reward weights recorded in this bucket
    pub fn rewards(&self) -> f64 {
        self.rewards
    }

    /// Mean reward of this bucket, or None when nothing was recorded
    pub fn value(&self) -> Option<f64> {
        if self.trials == 0 {
            None
        } else {
            Some(self.rewards / self.trials as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_serie() {
        let serie = Serie::new();
        assert_eq!(serie.trials(), 0);
        assert_eq!(serie.value(), None);
    }

    #[test]
    fn test_observe() {
        let mut serie = Serie::new();
        serie.observe(1.0);
        serie.observe(0.0);
        serie.observe(1.0);

        assert_eq!(serie.trials(), 3);
        assert_eq!(serie.rewards(), 2.0);
        assert!((serie.value().unwrap() - 2.0 / 3.0).abs() < f64::EPSILON);
    }
}
