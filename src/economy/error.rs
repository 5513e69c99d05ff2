//! Error kinds raised by the economy engine.

use thiserror::Error;

/// Gameplay errors. None of these leave the state partially mutated.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EconomyError {
    /// `needed` is the total reached when pricing stopped, so for long exact
    /// requests it can be a lower bound. `u64::MAX` marks an unpayable request.
    #[error("insufficient funds: need {needed}, have {available:.2}")]
    InsufficientFunds { needed: u64, available: f64 },
    #[error("unknown item kind: {0}")]
    InvalidItemKind(String),
    #[error("prestige not available: lifetime {lifetime:.0} below threshold {threshold:.0}")]
    PrestigeNotEligible { lifetime: f64, threshold: f64 },
}

/// Balance configuration failed to parse or violates an invariant.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("balance config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("embedded balance config is invalid: {0}")]
    Embedded(String),
    #[error("no config entry for unit {0}")]
    MissingUnit(&'static str),
    #[error("no config entry for upgrade {0}")]
    MissingUpgrade(&'static str),
    #[error("no config entry for artifact {0}")]
    MissingArtifact(&'static str),
    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: f64 },
    #[error("{field} is out of range (got {value})")]
    OutOfRange { field: &'static str, value: f64 },
}

/// Save/load failures. Reported to the caller, never fatal to the session.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("corrupt save data: {0}")]
    CorruptSaveData(String),
    #[error("failed to write save: {0}")]
    PersistenceWriteFailure(String),
    #[error("save serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure reported by a storage backend.
#[derive(Debug, Error)]
#[error("storage error: {0}")]
pub struct StoreError(pub String);
