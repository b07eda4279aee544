//! Bonus composition: independent provider slots folded into production rates.
//!
//! External systems (prestige, inventory, world, procedural content,
//! seasonal events) contribute bonuses through the [`MultiplierProvider`]
//! trait. An unpopulated slot or an unimplemented axis contributes the
//! neutral value, so absence never errors and composition never depends
//! on registration order.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::catalog::{UpgradeCatalog, UpgradeKind};
use crate::constants::{CLICK_BASE_UNIT, DEFAULT_CRITICAL_CHANCE, DEFAULT_CRITICAL_MULTIPLIER};
use crate::numbers::{sanitize_chance, sanitize_factor};
use crate::rate::RateSnapshot;

/// Well-known registry slot names used by the stock collaborators.
pub mod slots {
    pub const PRESTIGE: &str = "prestige";
    pub const INVENTORY: &str = "inventory";
    pub const WORLD: &str = "world";
    pub const PROCEDURAL: &str = "procedural";
    pub const EVENT: &str = "event";
}

/// A named, optional source of bonus scalars. Every axis defaults to its
/// neutral value; implementors override only the axes they affect.
/// Implementations must be pure reads: they are queried on every rate
/// recomputation and must not mutate engine state.
pub trait MultiplierProvider {
    /// Multiplicative factor on automatic production.
    fn cps_multiplier(&self) -> f64 {
        1.0
    }

    /// Multiplicative factor on click production.
    fn cpc_multiplier(&self) -> f64 {
        1.0
    }

    /// Multiplicative factor on both production axes.
    fn total_multiplier(&self) -> f64 {
        1.0
    }

    /// Additive delta on the critical-hit chance.
    fn critical_chance_delta(&self) -> f64 {
        0.0
    }

    /// Multiplicative factor on the critical-hit payout.
    fn critical_multiplier(&self) -> f64 {
        1.0
    }
}

/// Engine-owned baseline for the critical-hit roll, persisted in the
/// checkpoint and modified by providers at composition time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalTunables {
    pub chance: f64,
    pub multiplier: f64,
}

impl Default for CriticalTunables {
    fn default() -> Self {
        Self {
            chance: DEFAULT_CRITICAL_CHANCE,
            multiplier: DEFAULT_CRITICAL_MULTIPLIER,
        }
    }
}

/// Registry of provider slots keyed by name.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Box<dyn MultiplierProvider>>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or replace the provider in the named slot.
    pub fn register(&mut self, name: &str, provider: Box<dyn MultiplierProvider>) {
        self.providers.insert(name.to_string(), provider);
    }

    /// Remove the named slot; the slot reverts to neutral.
    /// Returns whether a provider was present.
    pub fn remove(&mut self, name: &str) -> bool {
        self.providers.remove(name).is_some()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    fn fold<F>(&self, axis: F) -> f64
    where
        F: Fn(&dyn MultiplierProvider) -> f64,
    {
        self.providers
            .values()
            .map(|p| sanitize_factor(axis(p.as_ref())))
            .product()
    }

    fn sum<F>(&self, axis: F) -> f64
    where
        F: Fn(&dyn MultiplierProvider) -> f64,
    {
        self.providers
            .values()
            .map(|p| axis(p.as_ref()))
            .filter(|d| d.is_finite())
            .sum()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ProviderRegistry")
            .field("slots", &names)
            .finish()
    }
}

/// Additive base sum of `base_gain × level` over Active entries of the
/// given kind. Click production carries an implicit base of one click
/// unit before multipliers apply.
#[must_use]
pub fn base_sum(catalog: &UpgradeCatalog, levels: &HashMap<String, u32>, kind: UpgradeKind) -> f64 {
    let implicit = match kind {
        UpgradeKind::Click => CLICK_BASE_UNIT,
        UpgradeKind::Auto => 0.0,
    };
    catalog
        .active()
        .iter()
        .filter(|u| u.kind == kind)
        .map(|u| u.base_gain * f64::from(levels.get(&u.id).copied().unwrap_or(0)))
        .sum::<f64>()
        + implicit
}

/// Compose the full production snapshot. Multiplicative axes fold by
/// multiplication and additive axes by addition, so the result is
/// independent of provider iteration order.
#[must_use]
pub fn compose(
    catalog: &UpgradeCatalog,
    levels: &HashMap<String, u32>,
    registry: &ProviderRegistry,
    critical: CriticalTunables,
    now: f64,
) -> RateSnapshot {
    let total = registry.fold(|p| p.total_multiplier());
    let cps = base_sum(catalog, levels, UpgradeKind::Auto)
        * registry.fold(|p| p.cps_multiplier())
        * total;
    let cpc = base_sum(catalog, levels, UpgradeKind::Click)
        * registry.fold(|p| p.cpc_multiplier())
        * total;
    let crit_chance =
        sanitize_chance(critical.chance + registry.sum(|p| p.critical_chance_delta()));
    let crit_mult =
        sanitize_factor(critical.multiplier) * registry.fold(|p| p.critical_multiplier());

    RateSnapshot {
        cps,
        cpc,
        crit_chance,
        crit_mult,
        computed_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FLOAT_EPSILON;

    struct Flat {
        cps: f64,
        cpc: f64,
        crit_delta: f64,
    }

    impl MultiplierProvider for Flat {
        fn cps_multiplier(&self) -> f64 {
            self.cps
        }
        fn cpc_multiplier(&self) -> f64 {
            self.cpc
        }
        fn critical_chance_delta(&self) -> f64 {
            self.crit_delta
        }
    }

    fn two_auto_catalog() -> (UpgradeCatalog, HashMap<String, u32>) {
        let catalog = UpgradeCatalog::default();
        let mut levels = HashMap::new();
        levels.insert("auto_mouse".to_string(), 2); // base_gain 1
        levels.insert("junior_miner".to_string(), 1); // base_gain 10
        (catalog, levels)
    }

    #[test]
    fn base_sums_are_additive() {
        let (catalog, levels) = two_auto_catalog();
        let cps = base_sum(&catalog, &levels, UpgradeKind::Auto);
        assert!((cps - 12.0).abs() < FLOAT_EPSILON);
        // Click base includes the implicit unit.
        let cpc = base_sum(&catalog, &levels, UpgradeKind::Click);
        assert!((cpc - 1.0).abs() < FLOAT_EPSILON);
    }

    #[test]
    fn providers_multiply_into_cps() {
        let (catalog, levels) = two_auto_catalog();
        let mut registry = ProviderRegistry::new();
        registry.register(
            "a",
            Box::new(Flat {
                cps: 1.1,
                cpc: 1.0,
                crit_delta: 0.0,
            }),
        );
        registry.register(
            "b",
            Box::new(Flat {
                cps: 1.05,
                cpc: 1.0,
                crit_delta: 0.0,
            }),
        );
        let snap = compose(&catalog, &levels, &registry, CriticalTunables::default(), 0.0);
        assert!((snap.cps - 13.86).abs() < 1e-9);
    }

    #[test]
    fn composition_is_order_independent() {
        let (catalog, levels) = two_auto_catalog();
        let build = |order: &[(f64, f64)]| {
            let mut registry = ProviderRegistry::new();
            for (i, (cps, cpc)) in order.iter().enumerate() {
                registry.register(
                    &format!("p{i}"),
                    Box::new(Flat {
                        cps: *cps,
                        cpc: *cpc,
                        crit_delta: 0.01,
                    }),
                );
            }
            compose(&catalog, &levels, &registry, CriticalTunables::default(), 0.0)
        };
        let forward = build(&[(1.25, 1.5), (2.0, 1.1), (0.5, 3.0)]);
        let reversed = build(&[(0.5, 3.0), (2.0, 1.1), (1.25, 1.5)]);
        assert!((forward.cps - reversed.cps).abs() < 1e-9);
        assert!((forward.cpc - reversed.cpc).abs() < 1e-9);
        assert!((forward.crit_chance - reversed.crit_chance).abs() < 1e-9);
    }

    #[test]
    fn missing_providers_are_neutral() {
        let (catalog, levels) = two_auto_catalog();
        let registry = ProviderRegistry::new();
        let snap = compose(&catalog, &levels, &registry, CriticalTunables::default(), 0.0);
        assert!((snap.cps - 12.0).abs() < FLOAT_EPSILON);
        assert!((snap.cpc - 1.0).abs() < FLOAT_EPSILON);
        assert!((snap.crit_chance - 0.05).abs() < FLOAT_EPSILON);
        assert!((snap.crit_mult - 10.0).abs() < FLOAT_EPSILON);
    }

    #[test]
    fn critical_chance_clamps_to_unit_interval() {
        let (catalog, levels) = two_auto_catalog();
        let mut registry = ProviderRegistry::new();
        registry.register(
            "events",
            Box::new(Flat {
                cps: 1.0,
                cpc: 1.0,
                crit_delta: 5.0,
            }),
        );
        let snap = compose(&catalog, &levels, &registry, CriticalTunables::default(), 0.0);
        assert!((snap.crit_chance - 1.0).abs() < FLOAT_EPSILON);
    }
}
