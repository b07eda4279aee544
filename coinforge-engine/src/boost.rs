//! Power surge: a manually triggered earnings burst with a cooldown.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{SURGE_COOLDOWN_SECS, SURGE_DURATION_SECS, SURGE_MULTIPLIER};

/// Surge activation refused because the cooldown has not elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("surge on cooldown for {remaining_secs:.0}s")]
pub struct SurgeDenied {
    pub remaining_secs: f64,
}

/// Activation timestamps for the earnings burst. The burst multiplies
/// both accrual and click yield while active; the cooldown is measured
/// from activation, so it always outlasts the burst itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct SurgeState {
    #[serde(default)]
    pub started_at: f64,
    #[serde(default)]
    pub last_use: f64,
}

impl SurgeState {
    /// Start the burst at `now`, or report the remaining cooldown.
    pub fn activate(&mut self, now: f64) -> Result<(), SurgeDenied> {
        let since_last = now - self.last_use;
        if self.last_use > 0.0 && since_last < SURGE_COOLDOWN_SECS {
            return Err(SurgeDenied {
                remaining_secs: SURGE_COOLDOWN_SECS - since_last,
            });
        }
        self.started_at = now;
        self.last_use = now;
        Ok(())
    }

    /// Whether the burst window is open at `now`.
    #[must_use]
    pub fn is_active(&self, now: f64) -> bool {
        self.started_at > 0.0 && now >= self.started_at && now - self.started_at < SURGE_DURATION_SECS
    }

    /// Earnings factor at `now`: the surge multiplier while active,
    /// neutral otherwise.
    #[must_use]
    pub fn factor_at(&self, now: f64) -> f64 {
        if self.is_active(now) {
            SURGE_MULTIPLIER
        } else {
            1.0
        }
    }

    /// Seconds of burst left, zero when inactive.
    #[must_use]
    pub fn remaining_secs(&self, now: f64) -> f64 {
        if self.is_active(now) {
            SURGE_DURATION_SECS - (now - self.started_at)
        } else {
            0.0
        }
    }

    /// Seconds until the next activation is allowed, zero when ready.
    #[must_use]
    pub fn cooldown_remaining(&self, now: f64) -> f64 {
        if self.last_use > 0.0 {
            (SURGE_COOLDOWN_SECS - (now - self.last_use)).max(0.0)
        } else {
            0.0
        }
    }
}
