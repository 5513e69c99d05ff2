//! Host-tunable engine settings. Balance numbers live in `BalanceConfig`.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Storage key of the primary save record.
    pub primary_key: String,
    /// Storage key of the mirrored backup record.
    pub backup_key: String,
    pub tick_interval_ms: u64,
    /// Frame deltas longer than this are clamped.
    pub max_frame_delta_ms: u64,
    /// Ticked seconds between autosave requests. Zero disables autosave.
    pub autosave_interval_secs: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            primary_key: "idle_economy_save".to_string(),
            backup_key: "idle_economy_save_backup".to_string(),
            tick_interval_ms: 1000,
            max_frame_delta_ms: 5000,
            autosave_interval_secs: 30,
        }
    }
}
