use coinforge_engine::{
    Checkpoint, CheckpointStore, Engine, SaveStorage, UpgradeCatalog, CHECKPOINT_VERSION,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::convert::Infallible;
use std::rc::Rc;

const TOLERANCE: f64 = 1e-9;

#[derive(Clone, Default)]
struct MemoryStorage {
    slots: Rc<RefCell<HashMap<String, String>>>,
}

impl SaveStorage for MemoryStorage {
    type Error = Infallible;

    fn write(&self, slot: &str, payload: &str) -> Result<(), Self::Error> {
        self.slots
            .borrow_mut()
            .insert(slot.to_string(), payload.to_string());
        Ok(())
    }

    fn read(&self, slot: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.slots.borrow().get(slot).cloned())
    }

    fn delete(&self, slot: &str) -> Result<(), Self::Error> {
        self.slots.borrow_mut().remove(slot);
        Ok(())
    }
}

fn store_with(slot: &str, payload: &str) -> CheckpointStore<MemoryStorage> {
    let backend = MemoryStorage::default();
    backend.write(slot, payload).expect("memory write");
    CheckpointStore::new(backend)
}

#[test]
fn earliest_save_shape_still_loads() {
    // The first release stored only a balance and levels, camel-cased,
    // with a millisecond wall-clock timestamp.
    let store = store_with(
        "main",
        r#"{
            "coins": 5000,
            "upgradeLevels": { "manual_grip": 3, "auto_mouse": 1 },
            "lastSaveTime": 1700000000000
        }"#,
    );
    let checkpoint = store.load("main").expect("readable").expect("present");

    assert!((checkpoint.balance - 5_000.0).abs() < TOLERANCE);
    assert!((checkpoint.lifetime_earned - 5_000.0).abs() < TOLERANCE);
    assert_eq!(checkpoint.upgrade_levels["manual_grip"], 3);
    assert!((checkpoint.saved_at.expect("present") - 1_700_000_000.0).abs() < TOLERANCE);
    assert!((checkpoint.critical_chance - 0.05).abs() < TOLERANCE);
    assert!((checkpoint.critical_multiplier - 10.0).abs() < TOLERANCE);
    assert_eq!(checkpoint.version, 1);
}

#[test]
fn intermediate_shape_with_flat_combo_fields_loads() {
    let store = store_with(
        "main",
        r#"{
            "coins": 100.5,
            "totalCoinsEarned": 900.0,
            "upgradeLevels": {},
            "comboCount": 6,
            "lastComboTime": 1700000000250,
            "comboMultiplier": 1.3,
            "powerStartTime": 1699999990000,
            "lastPowerUse": 1699999990000
        }"#,
    );
    let checkpoint = store.load("main").expect("readable").expect("present");

    assert_eq!(checkpoint.combo.count, 6);
    assert!((checkpoint.combo.last_click - 1_700_000_000.25).abs() < TOLERANCE);
    assert!((checkpoint.combo.multiplier - 1.3).abs() < TOLERANCE);
    assert!((checkpoint.surge.started_at - 1_699_999_990.0).abs() < TOLERANCE);
    assert!((checkpoint.lifetime_earned - 900.0).abs() < TOLERANCE);
}

#[test]
fn current_shape_roundtrips_through_storage() {
    let storage = MemoryStorage::default();
    let store = CheckpointStore::new(storage);

    let mut checkpoint = Checkpoint {
        balance: 123_456.789,
        lifetime_earned: 999_999.0,
        saved_at: Some(1_700_000_123.0),
        auto_buy_enabled: true,
        ..Checkpoint::default()
    };
    checkpoint
        .upgrade_levels
        .insert("gold_machine".to_string(), 12);

    store.save("main", &checkpoint).expect("save succeeds");
    let loaded = store.load("main").expect("readable").expect("present");
    assert_eq!(loaded, checkpoint);
    assert_eq!(loaded.version, CHECKPOINT_VERSION);
}

#[test]
fn wrong_typed_fields_fall_back_to_defaults() {
    let store = store_with(
        "main",
        r#"{
            "coins": "plenty",
            "upgradeLevels": { "manual_grip": "three", "auto_mouse": 2 },
            "criticalChance": null,
            "comboCount": -4
        }"#,
    );
    let checkpoint = store.load("main").expect("readable").expect("present");

    assert!((checkpoint.balance - 0.0).abs() < TOLERANCE);
    // Unreadable level entries are dropped, readable ones kept.
    assert!(!checkpoint.upgrade_levels.contains_key("manual_grip"));
    assert_eq!(checkpoint.upgrade_levels["auto_mouse"], 2);
    assert!((checkpoint.critical_chance - 0.05).abs() < TOLERANCE);
    assert_eq!(checkpoint.combo.count, 0);
}

#[test]
fn truncated_payload_loads_as_absent() {
    let store = store_with("main", r#"{"coins": 50, "upgradeLev"#);
    assert!(store.load("main").expect("readable").is_none());
}

#[test]
fn hidden_upgrade_ownership_survives_a_migration() {
    // A promoted-and-purchased upgrade must stay purchasable after the
    // save round trip even though the stored rate is never trusted.
    let store = store_with(
        "main",
        r#"{
            "coins": 0,
            "upgradeLevels": { "energy_satellite": 1 }
        }"#,
    );
    let checkpoint = store.load("main").expect("readable").expect("present");
    let mut engine = Engine::restore(UpgradeCatalog::default(), 3, checkpoint, 0.0);

    assert!(engine.catalog().is_active("energy_satellite"));
    assert!((engine.rate(0.0).cps - 3_000.0).abs() < TOLERANCE);
}
