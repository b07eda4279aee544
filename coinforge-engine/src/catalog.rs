//! Upgrade catalog: purchasable production sources and unlock promotion.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Whether an upgrade boosts manual clicks or automatic production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UpgradeKind {
    #[default]
    Click,
    Auto,
}

impl UpgradeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for UpgradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpgradeKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "click" => Ok(Self::Click),
            "auto" => Ok(Self::Auto),
            _ => Err(()),
        }
    }
}

/// Level gate on another upgrade that must be met before purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prerequisite {
    pub id: String,
    pub level: u32,
}

/// A single immutable catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeDefinition {
    pub id: String,
    pub name: String,
    pub desc: String,
    pub icon: String,
    pub base_cost: f64,
    /// Geometric cost growth per level; must be > 1 for a strictly
    /// increasing curve.
    pub cost_multiplier: f64,
    pub base_gain: f64,
    pub kind: UpgradeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerequisite: Option<Prerequisite>,
    /// Production-rate threshold that moves the entry out of the hidden
    /// list. Entries without a threshold start purchasable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlock_cps: Option<f64>,
}

impl UpgradeDefinition {
    /// Cost of the next level given the current owned level.
    #[must_use]
    pub fn cost_at(&self, level: u32) -> f64 {
        self.base_cost * self.cost_multiplier.powf(f64::from(level))
    }
}

/// Reason a purchase attempt was refused. State is unchanged on denial.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PurchaseDenied {
    #[error("unknown upgrade '{0}'")]
    UnknownUpgrade(String),
    #[error("requires '{required_id}' at level {required_level} (currently {current_level})")]
    PrerequisiteUnmet {
        required_id: String,
        required_level: u32,
        current_level: u32,
    },
    #[error("costs {cost} but only {balance} is available")]
    InsufficientFunds { cost: f64, balance: f64 },
}

/// The two disjoint upgrade collections: Active entries are purchasable,
/// Locked entries are hidden until their cps threshold is crossed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeCatalog {
    active: Vec<UpgradeDefinition>,
    locked: Vec<UpgradeDefinition>,
}

impl UpgradeCatalog {
    /// Build a catalog from explicit lists. Locked membership is taken
    /// from the list, not from `unlock_cps`, so hosts can pre-promote.
    #[must_use]
    pub fn from_lists(active: Vec<UpgradeDefinition>, locked: Vec<UpgradeDefinition>) -> Self {
        Self { active, locked }
    }

    #[must_use]
    pub fn active(&self) -> &[UpgradeDefinition] {
        &self.active
    }

    #[must_use]
    pub fn locked(&self) -> &[UpgradeDefinition] {
        &self.locked
    }

    /// Find a definition by id across both lists.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&UpgradeDefinition> {
        self.active
            .iter()
            .find(|u| u.id == id)
            .or_else(|| self.locked.iter().find(|u| u.id == id))
    }

    #[must_use]
    pub fn is_active(&self, id: &str) -> bool {
        self.active.iter().any(|u| u.id == id)
    }

    /// Cost of the next level for `id` at the given owned level.
    /// Unknown ids price at infinity, the unaffordable sentinel.
    #[must_use]
    pub fn cost(&self, id: &str, level: u32) -> f64 {
        self.find(id)
            .map_or(f64::INFINITY, |def| def.cost_at(level))
    }

    /// Move every Locked entry whose threshold the current cps meets
    /// (inclusive) into Active, returning the moved definitions in list
    /// order for notification. Re-invoking with the same or lower cps
    /// promotes nothing further.
    pub fn promote_unlocked(&mut self, current_cps: f64) -> Vec<UpgradeDefinition> {
        let mut promoted = Vec::new();
        let mut index = 0;
        while index < self.locked.len() {
            let threshold = self.locked[index].unlock_cps.unwrap_or(0.0);
            if current_cps >= threshold {
                let def = self.locked.remove(index);
                self.active.push(def.clone());
                promoted.push(def);
            } else {
                index += 1;
            }
        }
        promoted
    }

    /// Promote every Locked entry the player already owns levels in.
    /// Used on restore so that membership survives a checkpoint round
    /// trip even before the rate re-crosses the threshold.
    pub fn promote_owned<'a, I>(&mut self, owned_ids: I) -> Vec<UpgradeDefinition>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut promoted = Vec::new();
        for id in owned_ids {
            if let Some(pos) = self.locked.iter().position(|u| u.id == id) {
                let def = self.locked.remove(pos);
                self.active.push(def.clone());
                promoted.push(def);
            }
        }
        promoted
    }

    /// The hidden entry with the lowest threshold, shown to the player
    /// as the next goal hint.
    #[must_use]
    pub fn next_locked(&self) -> Option<&UpgradeDefinition> {
        self.locked.iter().min_by(|a, b| {
            let ta = a.unlock_cps.unwrap_or(0.0);
            let tb = b.unlock_cps.unwrap_or(0.0);
            ta.total_cmp(&tb)
        })
    }
}

impl Default for UpgradeCatalog {
    /// The stock catalog: seven purchasable upgrades and four hidden
    /// ones gated behind cps milestones.
    fn default() -> Self {
        let click = |id: &str, name: &str, desc: &str, icon: &str, cost: f64, mult: f64, gain: f64| {
            UpgradeDefinition {
                id: id.to_string(),
                name: name.to_string(),
                desc: desc.to_string(),
                icon: icon.to_string(),
                base_cost: cost,
                cost_multiplier: mult,
                base_gain: gain,
                kind: UpgradeKind::Click,
                prerequisite: None,
                unlock_cps: None,
            }
        };
        let auto = |id: &str, name: &str, desc: &str, icon: &str, cost: f64, mult: f64, gain: f64| {
            UpgradeDefinition {
                kind: UpgradeKind::Auto,
                ..click(id, name, desc, icon, cost, mult, gain)
            }
        };

        let mut algorithm_boost = click(
            "algorithm_boost",
            "Algorithm Boost",
            "Optimizes critical rate and mining efficiency.",
            "💎",
            500.0,
            1.2,
            0.5,
        );
        algorithm_boost.prerequisite = Some(Prerequisite {
            id: "manual_grip".to_string(),
            level: 5,
        });

        let active = vec![
            click(
                "manual_grip",
                "Manual Grip",
                "Builds muscle for more effective clicks.",
                "✊",
                10.0,
                1.15,
                0.05,
            ),
            algorithm_boost,
            click(
                "titanium_finger",
                "Titanium Finger",
                "Improves the base gain per click.",
                "💪",
                15.0,
                1.15,
                0.1,
            ),
            auto(
                "auto_mouse",
                "Auto Mouse",
                "An assistant that clicks for you.",
                "🖱️",
                100.0,
                1.15,
                1.0,
            ),
            auto(
                "junior_miner",
                "Junior Miner",
                "A miner in training.",
                "⛏️",
                1_000.0,
                1.14,
                10.0,
            ),
            auto(
                "clone_farm",
                "Clone Farm",
                "Clones mining around the clock.",
                "🤖",
                12_000.0,
                1.13,
                80.0,
            ),
            auto(
                "gold_machine",
                "Gold Machine",
                "Coin production at industrial scale.",
                "🏭",
                150_000.0,
                1.12,
                500.0,
            ),
        ];

        let gated = |def: UpgradeDefinition, threshold: f64| UpgradeDefinition {
            unlock_cps: Some(threshold),
            ..def
        };
        let locked = vec![
            gated(
                auto(
                    "energy_satellite",
                    "Energy Satellite",
                    "Optimizes the global mining network.",
                    "🛰️",
                    1_000_000.0,
                    1.11,
                    3_000.0,
                ),
                1_000.0,
            ),
            gated(
                auto(
                    "quantum_fusion",
                    "Quantum Fusion",
                    "Coin generation through wormholes.",
                    "🌌",
                    5_000_000.0,
                    1.1,
                    15_000.0,
                ),
                5_000.0,
            ),
            gated(
                auto(
                    "temporal_portal",
                    "Temporal Portal",
                    "Brings coins back from future timelines.",
                    "🌀",
                    100_000_000.0,
                    1.09,
                    100_000.0,
                ),
                50_000.0,
            ),
            gated(
                auto(
                    "parallel_universe",
                    "Parallel Universe",
                    "Access to coins in alternate dimensions.",
                    "🪐",
                    1_000_000_000.0,
                    1.08,
                    1_000_000.0,
                ),
                500_000.0,
            ),
        ];

        Self { active, locked }
    }
}
