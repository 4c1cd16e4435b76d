//! Pacing rules for citation harvesting.

use rand::Rng;
use std::time::Duration;

/// How the harvester spaces and filters its searches.
///
/// Defaults follow the 10–20 s spacing that keeps scholarly search services
/// from throttling a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestPolicy {
    pub min_delay: Duration,
    pub max_delay: Duration,
    /// Only the first N search hits are inspected for an open PDF.
    pub max_hits_considered: usize,
    /// Longer pause before retrying a search the service rate limited.
    pub cooldown_min: Duration,
    pub cooldown_max: Duration,
}

impl Default for HarvestPolicy {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(20),
            max_hits_considered: 5,
            cooldown_min: Duration::from_secs(30),
            cooldown_max: Duration::from_secs(60),
        }
    }
}

impl HarvestPolicy {
    /// No waiting at all; used by tests and `--no-delay` style runs.
    pub fn immediate() -> Self {
        Self {
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            cooldown_min: Duration::ZERO,
            cooldown_max: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Uniformly jittered delay in `[min_delay, max_delay]`.
    pub fn next_delay(&self) -> Duration {
        jitter(self.min_delay, self.max_delay)
    }

    /// Jittered pause in `[cooldown_min, cooldown_max]` after a rate limit.
    pub fn next_cooldown(&self) -> Duration {
        jitter(self.cooldown_min, self.cooldown_max)
    }
}

fn jitter(a: Duration, b: Duration) -> Duration {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    if lo == hi {
        return lo;
    }
    let secs = rand::thread_rng().gen_range(lo.as_secs_f64()..=hi.as_secs_f64());
    Duration::from_secs_f64(secs)
}
