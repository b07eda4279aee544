//! Centralized balance and tuning constants for Coinforge game logic.
//!
//! These values define the deterministic math for the progression core.
//! Keeping them together ensures that gameplay can only be adjusted via
//! code changes reviewed in version control, rather than through external
//! JSON assets.

// Rate cache ---------------------------------------------------------------
pub(crate) const RATE_CACHE_TTL_SECS: f64 = 1.0;

// Click tuning -------------------------------------------------------------
pub(crate) const CLICK_BASE_UNIT: f64 = 1.0;
pub(crate) const DEFAULT_CRITICAL_CHANCE: f64 = 0.05;
pub(crate) const DEFAULT_CRITICAL_MULTIPLIER: f64 = 10.0;

// Combo tuning -------------------------------------------------------------
pub(crate) const COMBO_WINDOW_SECS: f64 = 2.0;
pub(crate) const COMBO_STEP: f64 = 0.05;
pub(crate) const COMBO_MAX_MULTIPLIER: f64 = 3.0;

// Power surge tuning -------------------------------------------------------
pub(crate) const SURGE_MULTIPLIER: f64 = 5.0;
pub(crate) const SURGE_DURATION_SECS: f64 = 30.0;
pub(crate) const SURGE_COOLDOWN_SECS: f64 = 60.0;

// Auto-buy tuning ----------------------------------------------------------
pub(crate) const AUTO_BUY_INTERVAL_SECS: f64 = 1.0;

#[cfg(test)]
pub(crate) const FLOAT_EPSILON: f64 = 1e-9;
