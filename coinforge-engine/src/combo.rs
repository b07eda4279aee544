//! Click combo: a short-lived multiplicative bonus for rapid interaction.
use serde::{Deserialize, Serialize};

use crate::constants::{COMBO_MAX_MULTIPLIER, COMBO_STEP, COMBO_WINDOW_SECS};

/// Streak tracking for consecutive rapid clicks. The multiplier applies
/// to click yield only and decays to baseline once the rolling window
/// elapses without a new interaction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComboState {
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub last_click: f64,
    #[serde(default = "neutral_multiplier")]
    pub multiplier: f64,
}

const fn neutral_multiplier() -> f64 {
    1.0
}

impl Default for ComboState {
    fn default() -> Self {
        Self {
            count: 0,
            last_click: 0.0,
            multiplier: 1.0,
        }
    }
}

impl ComboState {
    /// Record a click at `now` and return the multiplier to apply to it.
    /// A click inside the window extends the streak; outside it the
    /// streak restarts at one (which still earns the first step bonus).
    pub fn register_click(&mut self, now: f64) -> f64 {
        if self.count > 0 && now - self.last_click < COMBO_WINDOW_SECS && now >= self.last_click {
            self.count += 1;
        } else {
            self.count = 1;
        }
        let bonus = (f64::from(self.count) * COMBO_STEP).min(COMBO_MAX_MULTIPLIER - 1.0);
        self.multiplier = 1.0 + bonus;
        self.last_click = now;
        self.multiplier
    }

    /// Whether the streak window is still open at `now`.
    #[must_use]
    pub fn is_active(&self, now: f64) -> bool {
        self.count > 0 && now >= self.last_click && now - self.last_click < COMBO_WINDOW_SECS
    }

    /// The display multiplier at `now`: the streak value while the
    /// window is open, baseline once it lapses.
    #[must_use]
    pub fn multiplier_at(&self, now: f64) -> f64 {
        if self.is_active(now) {
            self.multiplier
        } else {
            1.0
        }
    }
}
