//! Coinforge Engine
//!
//! Platform-agnostic core progression logic for the Coinforge idle game.
//! This crate provides resource accrual, the upgrade economy, and save
//! persistence without UI or platform-specific dependencies. Hosts drive
//! the engine with explicit timestamps (seconds); it never reads a clock.

pub mod boost;
pub mod catalog;
pub mod checkpoint;
pub mod combo;
mod constants;
pub mod engine;
pub mod multipliers;
pub mod numbers;
pub mod offline;
pub mod rate;

// Re-export commonly used types
pub use boost::{SurgeDenied, SurgeState};
pub use catalog::{
    Prerequisite, PurchaseDenied, UpgradeCatalog, UpgradeDefinition, UpgradeKind,
};
pub use checkpoint::{Checkpoint, CheckpointStore, SaveStorage, CHECKPOINT_VERSION};
pub use combo::ComboState;
pub use engine::{ClickOutcome, Engine, EngineEvent, PurchaseReceipt};
pub use multipliers::{slots, CriticalTunables, MultiplierProvider, ProviderRegistry};
pub use numbers::format_compact;
pub use rate::RateSnapshot;

/// Main runtime for managing a game instance over a storage backend.
/// Hosts own one of these; the inner [`Engine`] is exposed for direct
/// simulation calls while save handling stays behind the runtime.
pub struct GameRuntime<S>
where
    S: SaveStorage,
{
    engine: Engine,
    store: CheckpointStore<S>,
}

impl<S> GameRuntime<S>
where
    S: SaveStorage,
{
    /// Start a fresh game with the stock catalog.
    #[must_use]
    pub fn new_game(storage: S, seed: u64) -> Self {
        Self {
            engine: Engine::new(UpgradeCatalog::default(), seed),
            store: CheckpointStore::new(storage),
        }
    }

    /// Resume from the named slot, or start fresh when it is empty or
    /// unreadable. Offline earnings are granted during restore.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage backend cannot be read.
    pub fn resume(storage: S, seed: u64, slot: &str, now: f64) -> anyhow::Result<Self> {
        let store = CheckpointStore::new(storage);
        let engine = match store.load(slot)? {
            Some(checkpoint) => Engine::restore(UpgradeCatalog::default(), seed, checkpoint, now),
            None => Engine::new(UpgradeCatalog::default(), seed),
        };
        Ok(Self { engine, store })
    }

    /// Persist the current state into the named slot.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the backend write fails.
    pub fn save(&self, slot: &str, now: f64) -> anyhow::Result<()> {
        self.store.save(slot, &self.engine.checkpoint(now))
    }

    /// Remove the named slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend delete fails.
    pub fn wipe(&self, slot: &str) -> anyhow::Result<()> {
        self.store.delete(slot)
    }

    #[must_use]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }
}
