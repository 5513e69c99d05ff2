//! Save/load with a mirrored backup record.
//!
//! ## Versioning
//!
//! - `SAVE_VERSION`: current record format. Bump when fields are added.
//! - `MIN_COMPATIBLE_VERSION`: oldest record still accepted. Only bump on a
//!   breaking change (a field changes meaning or disappears).
//!
//! Compatible older records are merged over a default state: fields present in
//! the record win, missing fields keep their defaults. Derived fields (yield
//! rates, prestige multiplier) are checked against values recomputed from the
//! source counts and corrected when they disagree.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::artifacts::recompute_modifiers;
use super::config::{ArtifactId, BalanceConfig, CatalogId, UnitKind, UpgradeId};
use super::error::{SaveError, StoreError};
use super::state::{expected_yield_rates, prestige_multiplier_for, EconomyState};
use crate::settings::EngineSettings;

/// Save record format version. Increment when fields are added.
pub const SAVE_VERSION: u32 = 2;

/// Oldest record version that can still be merged.
pub const MIN_COMPATIBLE_VERSION: u32 = 1;

/// Relative tolerance when checking persisted derived values.
const DERIVED_TOLERANCE: f64 = 1e-9;

/// The persisted key-value record.
#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SaveRecord {
    /// Records written before versioning count as version 1.
    #[serde(default = "legacy_version")]
    pub version: u32,
    pub currency: f64,
    pub lifetime_currency: Option<f64>,
    pub units_owned: Option<BTreeMap<String, u64>>,
    pub unit_yield_rate: Option<BTreeMap<String, f64>>,
    pub upgrade_level: Option<BTreeMap<String, u64>>,
    pub prestige_currency: u64,
    pub prestige_multiplier: Option<f64>,
    pub total_prestige_count: Option<u32>,
    pub unlocked_artifacts: Option<Vec<String>>,
    pub display_uses_exponential_notation: Option<bool>,
    /// Milliseconds since the Unix epoch.
    pub last_saved_timestamp: Option<u64>,
}

fn legacy_version() -> u32 {
    1
}

/// Which copy a state was restored from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SaveSlot {
    Primary,
    Backup,
}

/// Result of a save attempt. `success` means at least one copy was written.
#[derive(Debug, Default)]
pub struct SaveReport {
    pub success: bool,
    pub errors: Vec<SaveError>,
}

/// Result of a load attempt. `state` is `None` when no usable save exists.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub state: Option<EconomyState>,
    pub source: Option<SaveSlot>,
    pub saved_at: Option<u64>,
    /// Problems met along the way, including a discarded primary record.
    pub errors: Vec<SaveError>,
}

/// A durable key-value backend.
pub trait SaveStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-process store for native hosts and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SaveStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Browser localStorage. Only available on WASM.
#[cfg(target_arch = "wasm32")]
pub struct LocalStorageStore {
    storage: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    /// `None` when the window or its storage is unavailable.
    pub fn new() -> Option<Self> {
        let storage = web_sys::window()?.local_storage().ok()??;
        Some(Self { storage })
    }
}

#[cfg(target_arch = "wasm32")]
impl SaveStore for LocalStorageStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage
            .get_item(key)
            .map_err(|e| StoreError(format!("{e:?}")))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StoreError(format!("{e:?}")))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.storage
            .remove_item(key)
            .map_err(|e| StoreError(format!("{e:?}")))
    }
}

/// Extract the persisted record from a state.
pub fn extract_save(state: &EconomyState, timestamp_ms: u64) -> SaveRecord {
    SaveRecord {
        version: SAVE_VERSION,
        currency: state.currency,
        lifetime_currency: Some(state.lifetime_currency),
        units_owned: Some(
            state
                .units_owned
                .iter()
                .map(|(k, n)| (k.key().to_string(), *n))
                .collect(),
        ),
        unit_yield_rate: Some(
            state
                .unit_yield_rate
                .iter()
                .map(|(k, r)| (k.key().to_string(), *r))
                .collect(),
        ),
        upgrade_level: Some(
            state
                .upgrade_level
                .iter()
                .map(|(id, l)| (id.key().to_string(), *l))
                .collect(),
        ),
        prestige_currency: state.prestige_currency,
        prestige_multiplier: Some(state.prestige_multiplier),
        total_prestige_count: Some(state.total_prestige_count),
        unlocked_artifacts: Some(
            state
                .unlocked_artifacts
                .iter()
                .map(|id| id.key().to_string())
                .collect(),
        ),
        display_uses_exponential_notation: Some(state.display_uses_exponential_notation),
        last_saved_timestamp: Some(timestamp_ms),
    }
}

/// Parse and validate a stored payload. Never adopts a malformed record partially.
pub fn decode_save(json: &str) -> Result<SaveRecord, SaveError> {
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| SaveError::CorruptSaveData(format!("unparseable payload: {e}")))?;

    for field in ["currency", "prestigeCurrency"] {
        if !value.get(field).is_some_and(serde_json::Value::is_number) {
            return Err(SaveError::CorruptSaveData(format!(
                "{field} missing or not a number"
            )));
        }
    }

    let record: SaveRecord = serde_json::from_value(value)
        .map_err(|e| SaveError::CorruptSaveData(e.to_string()))?;

    if record.version < MIN_COMPATIBLE_VERSION {
        return Err(SaveError::CorruptSaveData(format!(
            "save version {} is older than minimum compatible {}",
            record.version, MIN_COMPATIBLE_VERSION
        )));
    }

    check_amount("currency", record.currency)?;
    if let Some(lifetime) = record.lifetime_currency {
        check_amount("lifetimeCurrency", lifetime)?;
    }
    if let Some(multiplier) = record.prestige_multiplier {
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(SaveError::CorruptSaveData(format!(
                "prestigeMultiplier {multiplier} below 1"
            )));
        }
    }
    if let Some(rates) = &record.unit_yield_rate {
        for (key, rate) in rates {
            check_amount(key, *rate)?;
        }
    }

    Ok(record)
}

fn check_amount(field: &str, value: f64) -> Result<(), SaveError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SaveError::CorruptSaveData(format!(
            "{field} must be a non-negative number (got {value})"
        )))
    }
}

/// Merge a validated record over a default state, then rebuild derived fields.
pub fn apply_save(config: &BalanceConfig, record: &SaveRecord) -> Result<EconomyState, SaveError> {
    let mut state = EconomyState::new(config);

    if record.version < SAVE_VERSION {
        info!(
            "migrating save record (saved={}, current={})",
            record.version, SAVE_VERSION
        );
    }

    state.currency = record.currency;
    state.prestige_currency = record.prestige_currency;
    if let Some(lifetime) = record.lifetime_currency {
        state.lifetime_currency = lifetime;
    }
    if let Some(count) = record.total_prestige_count {
        state.total_prestige_count = count;
    }
    if let Some(flag) = record.display_uses_exponential_notation {
        state.display_uses_exponential_notation = flag;
    }

    for (key, owned) in record.units_owned.iter().flatten() {
        match UnitKind::from_key(key) {
            Some(kind) => {
                state.units_owned.insert(kind, *owned);
            }
            None => debug!("ignoring unknown unit in save: {key}"),
        }
    }

    for (key, level) in record.upgrade_level.iter().flatten() {
        match UpgradeId::from_key(key) {
            Some(id) => {
                state.upgrade_level.insert(id, *level);
            }
            None => debug!("ignoring unknown upgrade in save: {key}"),
        }
    }

    let unlocked: BTreeSet<ArtifactId> = record
        .unlocked_artifacts
        .iter()
        .flatten()
        .filter_map(|key| {
            let id = ArtifactId::from_key(key);
            if id.is_none() {
                debug!("ignoring unknown artifact in save: {key}");
            }
            id
        })
        .collect();
    state.modifiers = recompute_modifiers(config, &unlocked)
        .map_err(|e| SaveError::CorruptSaveData(e.to_string()))?;
    state.unlocked_artifacts = unlocked;

    let expected_multiplier = prestige_multiplier_for(config, state.prestige_currency);
    state.prestige_multiplier = match record.prestige_multiplier {
        Some(saved) if close(saved, expected_multiplier) => saved,
        Some(saved) => {
            warn!(
                "saved prestige multiplier {saved} disagrees with {expected_multiplier}; recomputed"
            );
            expected_multiplier
        }
        None => expected_multiplier,
    };

    let saved_rates: BTreeMap<UnitKind, f64> = record
        .unit_yield_rate
        .iter()
        .flatten()
        .filter_map(|(key, rate)| Some((UnitKind::from_key(key)?, *rate)))
        .collect();
    state.unit_yield_rate = expected_yield_rates(config, &state.upgrade_level)
        .into_iter()
        .map(|(kind, expected)| match saved_rates.get(&kind) {
            Some(saved) if close(*saved, expected) => (kind, *saved),
            Some(saved) => {
                warn!(
                    "saved yield rate for {} ({saved}) disagrees with {expected}; recomputed",
                    kind.key()
                );
                (kind, expected)
            }
            None => (kind, expected),
        })
        .collect();

    state.recompute_yields(config);
    Ok(state)
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= DERIVED_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

/// Primary + backup persistence over a [`SaveStore`].
pub struct PersistenceGateway<S: SaveStore> {
    store: S,
    primary_key: String,
    backup_key: String,
}

impl<S: SaveStore> PersistenceGateway<S> {
    pub fn new(store: S, settings: &EngineSettings) -> Self {
        Self {
            store,
            primary_key: settings.primary_key.clone(),
            backup_key: settings.backup_key.clone(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Write the state to both copies. Safe to call redundantly; each call
    /// overwrites the same keys.
    pub fn save(&self, state: &EconomyState, timestamp_ms: u64) -> SaveReport {
        let json = match serde_json::to_string(&extract_save(state, timestamp_ms)) {
            Ok(json) => json,
            Err(e) => {
                warn!("failed to serialize save: {e}");
                return SaveReport {
                    success: false,
                    errors: vec![SaveError::Serialization(e)],
                };
            }
        };

        let mut report = SaveReport::default();
        for key in [&self.primary_key, &self.backup_key] {
            match self.store.write(key, &json) {
                Ok(()) => report.success = true,
                Err(e) => {
                    warn!("failed to write save to {key}: {e}");
                    report
                        .errors
                        .push(SaveError::PersistenceWriteFailure(format!("{key}: {e}")));
                }
            }
        }
        report
    }

    /// Restore from the primary copy, falling back to the backup.
    pub fn load(&self, config: &BalanceConfig) -> LoadReport {
        let mut report = LoadReport::default();
        for (slot, key) in [
            (SaveSlot::Primary, &self.primary_key),
            (SaveSlot::Backup, &self.backup_key),
        ] {
            let json = match self.store.read(key) {
                Ok(Some(json)) => json,
                Ok(None) => continue,
                Err(e) => {
                    warn!("failed to read save from {key}: {e}");
                    report
                        .errors
                        .push(SaveError::CorruptSaveData(format!("{key}: {e}")));
                    continue;
                }
            };

            match decode_save(&json).and_then(|record| {
                let state = apply_save(config, &record)?;
                Ok((state, record.last_saved_timestamp))
            }) {
                Ok((state, saved_at)) => {
                    report.state = Some(state);
                    report.source = Some(slot);
                    report.saved_at = saved_at;
                    return report;
                }
                Err(e) => {
                    warn!("discarding save at {key}: {e}");
                    report.errors.push(e);
                }
            }
        }
        report
    }

    /// Remove both copies.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(&self.primary_key)?;
        self.store.remove(&self.backup_key)
    }
}
