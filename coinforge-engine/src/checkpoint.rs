//! Checkpoint persistence: canonical schema, tolerant migration, and the
//! platform storage boundary.
//!
//! The save document went through several historical shapes (integer
//! coins, camel-case field names, millisecond timestamps). This module
//! owns the canonical schema and accepts every observed variant on the
//! way in; derived rates are never trusted from storage.
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::boost::SurgeState;
use crate::combo::ComboState;
use crate::constants::{DEFAULT_CRITICAL_CHANCE, DEFAULT_CRITICAL_MULTIPLIER};
use crate::numbers::{sanitize_chance, sanitize_currency, sanitize_factor};

/// Current save-schema version.
pub const CHECKPOINT_VERSION: u32 = 2;

const MILLIS_PER_SEC: f64 = 1_000.0;

/// Durable snapshot of progression state. One record per save slot,
/// fully overwritten on every save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub lifetime_earned: f64,
    #[serde(default)]
    pub upgrade_levels: HashMap<String, u32>,
    #[serde(default = "default_critical_chance")]
    pub critical_chance: f64,
    #[serde(default = "default_critical_multiplier")]
    pub critical_multiplier: f64,
    #[serde(default)]
    pub combo: ComboState,
    #[serde(default)]
    pub surge: SurgeState,
    #[serde(default)]
    pub auto_buy_enabled: bool,
    /// Seconds since the Unix epoch at save time. Absent in very old
    /// records; reconciliation treats absence as "no idle time".
    #[serde(default)]
    pub saved_at: Option<f64>,
}

const fn default_version() -> u32 {
    CHECKPOINT_VERSION
}

const fn default_critical_chance() -> f64 {
    DEFAULT_CRITICAL_CHANCE
}

const fn default_critical_multiplier() -> f64 {
    DEFAULT_CRITICAL_MULTIPLIER
}

impl Default for Checkpoint {
    fn default() -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            balance: 0.0,
            lifetime_earned: 0.0,
            upgrade_levels: HashMap::new(),
            critical_chance: DEFAULT_CRITICAL_CHANCE,
            critical_multiplier: DEFAULT_CRITICAL_MULTIPLIER,
            combo: ComboState::default(),
            surge: SurgeState::default(),
            auto_buy_enabled: false,
            saved_at: None,
        }
    }
}

fn field_f64(raw: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .find_map(|key| raw.get(key).and_then(Value::as_f64))
        .filter(|v| v.is_finite())
}

fn field_bool(raw: &Value, keys: &[&str]) -> Option<bool> {
    keys.iter().find_map(|key| raw.get(key).and_then(Value::as_bool))
}

fn levels_from(raw: &Value, keys: &[&str]) -> HashMap<String, u32> {
    let mut levels = HashMap::new();
    let Some(object) = keys.iter().find_map(|key| raw.get(key).and_then(Value::as_object))
    else {
        return levels;
    };
    for (id, value) in object {
        // Older saves rounded levels through floats; truncate and clamp.
        let level = value
            .as_u64()
            .or_else(|| value.as_f64().filter(|v| v.is_finite()).map(|v| v.max(0.0) as u64));
        if let Some(level) = level {
            levels.insert(id.clone(), u32::try_from(level).unwrap_or(u32::MAX));
        }
    }
    levels
}

fn combo_from(raw: &Value) -> ComboState {
    if let Some(combo) = raw.get("combo") {
        if let Ok(parsed) = serde_json::from_value::<ComboState>(combo.clone()) {
            return parsed;
        }
    }
    // Legacy flat fields with millisecond timestamps.
    let count = field_f64(raw, &["comboCount"]).map_or(0, |v| v.max(0.0) as u32);
    let last_click = field_f64(raw, &["lastComboTime"]).map_or(0.0, |ms| ms / MILLIS_PER_SEC);
    let multiplier = field_f64(raw, &["comboMultiplier"]).map_or(1.0, sanitize_factor);
    ComboState {
        count,
        last_click,
        multiplier,
    }
}

fn surge_from(raw: &Value) -> SurgeState {
    if let Some(surge) = raw.get("surge") {
        if let Ok(parsed) = serde_json::from_value::<SurgeState>(surge.clone()) {
            return parsed;
        }
    }
    // Legacy "power" fields with millisecond timestamps.
    let started_at = field_f64(raw, &["powerStartTime"]).map_or(0.0, |ms| ms / MILLIS_PER_SEC);
    let last_use = field_f64(raw, &["lastPowerUse"]).map_or(0.0, |ms| ms / MILLIS_PER_SEC);
    SurgeState {
        started_at,
        last_use,
    }
}

impl Checkpoint {
    /// Build a checkpoint from a raw save document of any historical
    /// shape. Absent fields take their documented defaults; numbers are
    /// sanitized. Never fails for a structurally valid record.
    #[must_use]
    pub fn migrate(raw: &Value) -> Self {
        let balance = sanitize_currency(field_f64(raw, &["balance", "coins"]).unwrap_or(0.0));
        // Older saves tracked no lifetime total; the balance at save
        // time is the best available lower bound.
        let lifetime_earned = field_f64(raw, &["lifetime_earned", "totalCoinsEarned"])
            .map_or(balance, sanitize_currency);
        let saved_at = field_f64(raw, &["saved_at"])
            .or_else(|| field_f64(raw, &["lastSaveTime"]).map(|ms| ms / MILLIS_PER_SEC));
        let version = field_f64(raw, &["version"]).map_or(1, |v| v.max(0.0) as u32);

        Self {
            version,
            balance,
            lifetime_earned,
            upgrade_levels: levels_from(raw, &["upgrade_levels", "upgradeLevels"]),
            critical_chance: field_f64(raw, &["critical_chance", "criticalChance"])
                .map_or(DEFAULT_CRITICAL_CHANCE, sanitize_chance),
            critical_multiplier: field_f64(raw, &["critical_multiplier", "criticalMultiplier"])
                .map_or(DEFAULT_CRITICAL_MULTIPLIER, sanitize_factor),
            combo: combo_from(raw),
            surge: surge_from(raw),
            auto_buy_enabled: field_bool(raw, &["auto_buy_enabled", "autoBuyEnabled"])
                .unwrap_or(false),
            saved_at,
        }
    }
}

/// Trait for abstracting the durable key-value save store.
/// Platform-specific implementations should provide this.
pub trait SaveStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist the serialized document under the named slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    fn write(&self, slot: &str, payload: &str) -> Result<(), Self::Error>;

    /// Read the serialized document for the named slot, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn read(&self, slot: &str) -> Result<Option<String>, Self::Error>;

    /// Remove the named slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be removed.
    fn delete(&self, slot: &str) -> Result<(), Self::Error>;
}

/// Checkpoint persistence over a platform storage backend. Corrupt or
/// unparseable records load as absent rather than failing startup.
pub struct CheckpointStore<S: SaveStorage> {
    backend: S,
}

impl<S: SaveStorage> CheckpointStore<S> {
    pub const fn new(backend: S) -> Self {
        Self { backend }
    }

    /// Serialize and overwrite the slot with the given checkpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the backend write fails.
    pub fn save(&self, slot: &str, checkpoint: &Checkpoint) -> anyhow::Result<()> {
        let payload = serde_json::to_string(checkpoint)?;
        self.backend.write(slot, &payload)?;
        debug!("checkpoint saved to slot '{slot}'");
        Ok(())
    }

    /// Load and migrate the slot's checkpoint. `None` when the slot is
    /// empty or its contents fail to parse.
    ///
    /// # Errors
    ///
    /// Returns an error only if the backend itself cannot be read.
    pub fn load(&self, slot: &str) -> anyhow::Result<Option<Checkpoint>> {
        let Some(payload) = self.backend.read(slot)? else {
            return Ok(None);
        };
        match serde_json::from_str::<Value>(&payload) {
            Ok(raw) => Ok(Some(Checkpoint::migrate(&raw))),
            Err(err) => {
                warn!("discarding unreadable checkpoint in slot '{slot}': {err}");
                Ok(None)
            }
        }
    }

    /// Remove the slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend delete fails.
    pub fn delete(&self, slot: &str) -> anyhow::Result<()> {
        self.backend.delete(slot)?;
        Ok(())
    }
}
