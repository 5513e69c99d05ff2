//! Idle-game economy engine.
//!
//! Units produce currency, upgrades compound unit output, and prestige trades
//! a cycle's lifetime earnings for permanent points and artifact unlocks.
//! Everything runs on one thread and is deterministic given the same inputs.

pub mod economy;
pub mod settings;
pub mod time;

pub use economy::config::{ArtifactId, BalanceConfig, CatalogId, UnitKind, UpgradeId};
pub use economy::cost::{PurchaseQuote, Quantity};
pub use economy::error::{ConfigError, EconomyError, SaveError, StoreError};
pub use economy::format::format_amount;
pub use economy::prestige::PrestigeOutcome;
#[cfg(target_arch = "wasm32")]
pub use economy::save::LocalStorageStore;
pub use economy::save::{LoadReport, MemoryStore, PersistenceGateway, SaveReport, SaveSlot, SaveStore};
pub use economy::state::{EconomyState, ModifierAccumulator};
pub use economy::EconomyEngine;
pub use settings::EngineSettings;
