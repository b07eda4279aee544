//! Short-lived memoization of composed production rates.
use serde::{Deserialize, Serialize};

use crate::constants::RATE_CACHE_TTL_SECS;

/// The cached result of multiplier composition, valid within the TTL.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateSnapshot {
    /// Currency per second from automatic production.
    pub cps: f64,
    /// Currency per manual interaction, before combo and surge.
    pub cpc: f64,
    /// Composed critical-hit chance in [0, 1].
    pub crit_chance: f64,
    /// Composed critical-hit payout factor.
    pub crit_mult: f64,
    pub computed_at: f64,
}

/// Bounds recomputation frequency under a high-frequency tick. The TTL
/// is a cost cap, not a gameplay delay: any mutation that changes the
/// rate must call [`RateCache::invalidate`] synchronously.
#[derive(Debug, Clone, Default)]
pub struct RateCache {
    snapshot: Option<RateSnapshot>,
}

impl RateCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached snapshot if it is still inside the TTL window.
    #[must_use]
    pub fn fresh(&self, now: f64) -> Option<RateSnapshot> {
        self.snapshot.filter(|s| {
            now >= s.computed_at && now - s.computed_at < RATE_CACHE_TTL_SECS
        })
    }

    pub fn store(&mut self, snapshot: RateSnapshot) {
        self.snapshot = Some(snapshot);
    }

    /// Force the next read to recompute regardless of age.
    pub fn invalidate(&mut self) {
        self.snapshot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(at: f64) -> RateSnapshot {
        RateSnapshot {
            cps: 12.0,
            cpc: 1.0,
            crit_chance: 0.05,
            crit_mult: 10.0,
            computed_at: at,
        }
    }

    #[test]
    fn snapshot_is_fresh_inside_ttl() {
        let mut cache = RateCache::new();
        cache.store(snap(100.0));
        assert!(cache.fresh(100.5).is_some());
        assert!(cache.fresh(101.0).is_none());
    }

    #[test]
    fn backwards_clock_is_treated_as_stale() {
        let mut cache = RateCache::new();
        cache.store(snap(100.0));
        assert!(cache.fresh(99.0).is_none());
    }

    #[test]
    fn invalidate_clears_even_fresh_snapshots() {
        let mut cache = RateCache::new();
        cache.store(snap(100.0));
        cache.invalidate();
        assert!(cache.fresh(100.0).is_none());
    }
}
