//! The progression engine: the single owner of all accrual state.
//!
//! Every other subsystem holds a handle to one [`Engine`] value instead
//! of reaching into shared globals. The host drives it with explicit
//! timestamps (seconds); the engine never reads a wall clock.
use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::collections::{HashMap, VecDeque};

use crate::boost::{SurgeDenied, SurgeState};
use crate::catalog::{PurchaseDenied, UpgradeCatalog, UpgradeDefinition};
use crate::checkpoint::{Checkpoint, CHECKPOINT_VERSION};
use crate::combo::ComboState;
use crate::constants::AUTO_BUY_INTERVAL_SECS;
use crate::multipliers::{compose, CriticalTunables, MultiplierProvider, ProviderRegistry};
use crate::offline;
use crate::rate::{RateCache, RateSnapshot};

/// Discrete notification for the presentation layer. Delivery is
/// fire-and-forget: events queue until the host drains them.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    UpgradePurchased {
        id: String,
        level: u32,
        cost: f64,
    },
    UpgradesPromoted(Vec<UpgradeDefinition>),
    OfflineGainGranted(f64),
    CriticalHit(f64),
    SurgeActivated {
        multiplier: f64,
    },
}

/// Result of a successful purchase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PurchaseReceipt {
    pub level: u32,
    pub cost: f64,
    pub balance: f64,
}

/// Result of one manual interaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickOutcome {
    pub amount: f64,
    pub critical: bool,
    pub combo_streak: u32,
    pub combo_multiplier: f64,
}

/// The resource accrual and progression engine.
pub struct Engine {
    balance: f64,
    lifetime_earned: f64,
    levels: HashMap<String, u32>,
    catalog: UpgradeCatalog,
    providers: ProviderRegistry,
    cache: RateCache,
    combo: ComboState,
    surge: SurgeState,
    critical: CriticalTunables,
    auto_buy_enabled: bool,
    last_auto_buy: f64,
    last_tick: Option<f64>,
    events: VecDeque<EngineEvent>,
    rng: ChaCha20Rng,
}

impl Engine {
    /// Fresh game with the given catalog. The seed drives critical-hit
    /// rolls only, so a fixed seed makes tests deterministic.
    #[must_use]
    pub fn new(catalog: UpgradeCatalog, seed: u64) -> Self {
        Self {
            balance: 0.0,
            lifetime_earned: 0.0,
            levels: HashMap::new(),
            catalog,
            providers: ProviderRegistry::new(),
            cache: RateCache::new(),
            combo: ComboState::default(),
            surge: SurgeState::default(),
            critical: CriticalTunables::default(),
            auto_buy_enabled: false,
            last_auto_buy: 0.0,
            last_tick: None,
            events: VecDeque::new(),
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Resume from a checkpoint, granting offline earnings exactly once.
    /// Catalog membership is rebuilt first (owned entries re-promote),
    /// then the restored rate prices the whole idle interval.
    #[must_use]
    pub fn restore(catalog: UpgradeCatalog, seed: u64, checkpoint: Checkpoint, now: f64) -> Self {
        let mut engine = Self::new(catalog, seed);
        engine.balance = checkpoint.balance;
        engine.lifetime_earned = checkpoint.lifetime_earned.max(checkpoint.balance);
        engine.levels = checkpoint.upgrade_levels;
        engine.critical = CriticalTunables {
            chance: checkpoint.critical_chance,
            multiplier: checkpoint.critical_multiplier,
        };
        engine.combo = checkpoint.combo;
        engine.surge = checkpoint.surge;
        engine.auto_buy_enabled = checkpoint.auto_buy_enabled;

        let owned: Vec<String> = engine
            .levels
            .iter()
            .filter(|&(_, level)| *level > 0)
            .map(|(id, _)| id.clone())
            .collect();
        let restored = engine
            .catalog
            .promote_owned(owned.iter().map(String::as_str));
        if !restored.is_empty() {
            debug!("re-promoted {} owned upgrades on restore", restored.len());
        }

        engine.cache.invalidate();
        let snapshot = engine.rate(now);
        let granted = offline::reconcile(checkpoint.saved_at, now, snapshot.cps);
        if granted > 0.0 {
            engine.balance += granted;
            engine.lifetime_earned += granted;
            engine.events.push_back(EngineEvent::OfflineGainGranted(granted));
            info!("granted {granted:.2} offline earnings");
        }
        engine
    }

    // --- Providers ---------------------------------------------------

    /// Install or replace a bonus provider; the rate is recomputed on
    /// the next read.
    pub fn register_provider(&mut self, name: &str, provider: Box<dyn MultiplierProvider>) {
        self.providers.register(name, provider);
        self.cache.invalidate();
    }

    /// Remove a provider slot, reverting it to neutral.
    pub fn remove_provider(&mut self, name: &str) -> bool {
        let removed = self.providers.remove(name);
        if removed {
            self.cache.invalidate();
        }
        removed
    }

    /// Signal that a provider's internal state changed (a buff expired,
    /// a prestige level was bought) without re-registration.
    pub fn providers_changed(&mut self) {
        self.cache.invalidate();
    }

    // --- Simulation --------------------------------------------------

    /// Current production snapshot, memoized within the cache TTL.
    pub fn rate(&mut self, now: f64) -> RateSnapshot {
        if let Some(snapshot) = self.cache.fresh(now) {
            return snapshot;
        }
        let snapshot = compose(&self.catalog, &self.levels, &self.providers, self.critical, now);
        self.cache.store(snapshot);
        snapshot
    }

    /// Advance the simulation to `now`: accrue automatic production over
    /// the elapsed delta, then promote any newly unlocked upgrades.
    /// Negative deltas (clock skew) accrue nothing.
    pub fn tick(&mut self, now: f64) {
        let delta = self
            .last_tick
            .map_or(0.0, |last| (now - last).max(0.0));
        self.last_tick = Some(now);

        let snapshot = self.rate(now);
        if delta > 0.0 && snapshot.cps > 0.0 {
            let earned = snapshot.cps * self.surge.factor_at(now) * delta;
            self.balance += earned;
            self.lifetime_earned += earned;
        }

        let promoted = self.catalog.promote_unlocked(snapshot.cps);
        if !promoted.is_empty() {
            debug!("promoted {} upgrades at cps {:.2}", promoted.len(), snapshot.cps);
            self.cache.invalidate();
            self.events.push_back(EngineEvent::UpgradesPromoted(promoted));
        }

        if self.auto_buy_enabled && now - self.last_auto_buy >= AUTO_BUY_INTERVAL_SECS {
            if let Some(id) = self.best_purchase() {
                let _ = self.purchase(&id);
            }
            self.last_auto_buy = now;
        }
    }

    /// One manual interaction: click yield with combo, surge, and an
    /// independent critical roll, credited atomically.
    pub fn click(&mut self, now: f64) -> ClickOutcome {
        let snapshot = self.rate(now);
        let combo_multiplier = self.combo.register_click(now);
        let mut amount = snapshot.cpc * combo_multiplier * self.surge.factor_at(now);

        let critical = self.rng.gen::<f64>() < snapshot.crit_chance;
        if critical {
            amount *= snapshot.crit_mult;
        }

        self.balance += amount;
        self.lifetime_earned += amount;
        if critical {
            self.events.push_back(EngineEvent::CriticalHit(amount));
        }

        ClickOutcome {
            amount,
            critical,
            combo_streak: self.combo.count,
            combo_multiplier,
        }
    }

    /// Buy one level of the given upgrade. Atomic: on denial neither
    /// the balance nor the level changes.
    pub fn purchase(&mut self, id: &str) -> Result<PurchaseReceipt, PurchaseDenied> {
        let level = self.upgrade_level(id);
        let (cost, prerequisite) = match self.catalog.find(id) {
            None => return Err(PurchaseDenied::UnknownUpgrade(id.to_string())),
            Some(def) => (def.cost_at(level), def.prerequisite.clone()),
        };

        if let Some(gate) = prerequisite {
            let current = self.upgrade_level(&gate.id);
            if current < gate.level {
                return Err(PurchaseDenied::PrerequisiteUnmet {
                    required_id: gate.id,
                    required_level: gate.level,
                    current_level: current,
                });
            }
        }
        if self.balance < cost {
            return Err(PurchaseDenied::InsufficientFunds {
                cost,
                balance: self.balance,
            });
        }

        self.balance = (self.balance - cost).max(0.0);
        let new_level = level + 1;
        self.levels.insert(id.to_string(), new_level);
        self.cache.invalidate();
        self.events.push_back(EngineEvent::UpgradePurchased {
            id: id.to_string(),
            level: new_level,
            cost,
        });

        Ok(PurchaseReceipt {
            level: new_level,
            cost,
            balance: self.balance,
        })
    }

    /// The affordable, prerequisite-satisfied upgrade with the best
    /// gain-per-coin ratio, used by the auto-buy step.
    #[must_use]
    pub fn best_purchase(&self) -> Option<String> {
        let mut best: Option<(f64, &str)> = None;
        for def in self.catalog.active() {
            let cost = def.cost_at(self.upgrade_level(&def.id));
            if self.balance < cost {
                continue;
            }
            if let Some(gate) = &def.prerequisite {
                if self.upgrade_level(&gate.id) < gate.level {
                    continue;
                }
            }
            let efficiency = def.base_gain / cost;
            if best.map_or(true, |(ratio, _)| efficiency > ratio) {
                best = Some((efficiency, &def.id));
            }
        }
        best.map(|(_, id)| id.to_string())
    }

    /// Start the power surge, or report the remaining cooldown.
    ///
    /// # Errors
    ///
    /// Returns [`SurgeDenied`] while the cooldown is running.
    pub fn activate_surge(&mut self, now: f64) -> Result<(), SurgeDenied> {
        self.surge.activate(now)?;
        self.events.push_back(EngineEvent::SurgeActivated {
            multiplier: self.surge.factor_at(now),
        });
        Ok(())
    }

    pub fn set_auto_buy(&mut self, enabled: bool) {
        self.auto_buy_enabled = enabled;
    }

    // --- Queries -----------------------------------------------------

    #[must_use]
    pub fn balance(&self) -> f64 {
        self.balance
    }

    #[must_use]
    pub fn lifetime_earned(&self) -> f64 {
        self.lifetime_earned
    }

    #[must_use]
    pub fn upgrade_level(&self, id: &str) -> u32 {
        self.levels.get(id).copied().unwrap_or(0)
    }

    /// Cost of the next level; infinity for unknown ids.
    #[must_use]
    pub fn cost(&self, id: &str) -> f64 {
        self.catalog.cost(id, self.upgrade_level(id))
    }

    /// Whether a purchase would currently succeed.
    #[must_use]
    pub fn can_purchase(&self, id: &str) -> bool {
        let Some(def) = self.catalog.find(id) else {
            return false;
        };
        if let Some(gate) = &def.prerequisite {
            if self.upgrade_level(&gate.id) < gate.level {
                return false;
            }
        }
        self.balance >= def.cost_at(self.upgrade_level(id))
    }

    #[must_use]
    pub fn catalog(&self) -> &UpgradeCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn combo(&self) -> &ComboState {
        &self.combo
    }

    #[must_use]
    pub fn surge(&self) -> &SurgeState {
        &self.surge
    }

    #[must_use]
    pub fn auto_buy_enabled(&self) -> bool {
        self.auto_buy_enabled
    }

    /// Drain all queued notifications.
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.events.drain(..).collect()
    }

    /// Snapshot the durable state for persistence.
    #[must_use]
    pub fn checkpoint(&self, now: f64) -> Checkpoint {
        Checkpoint {
            version: CHECKPOINT_VERSION,
            balance: self.balance,
            lifetime_earned: self.lifetime_earned,
            upgrade_levels: self.levels.clone(),
            critical_chance: self.critical.chance,
            critical_multiplier: self.critical.multiplier,
            combo: self.combo,
            surge: self.surge,
            auto_buy_enabled: self.auto_buy_enabled,
            saved_at: Some(now),
        }
    }
}
