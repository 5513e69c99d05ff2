//! Balance configuration: the immutable parameter table for units, upgrades,
//! prestige and artifacts.
//!
//! Every identifier is a closed enum. Each enum carries an explicit key table
//! used both by the JSON config and by the save record, so nothing derives a
//! field name from another string.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, EconomyError};

/// The canonical balance table shipped with the crate.
const EMBEDDED_BALANCE: &str = include_str!("../../assets/balance.json");

/// Shared behaviour for the closed identifier enums.
pub trait CatalogId: Copy + Ord + 'static {
    /// Every variant, in display order.
    fn all() -> &'static [Self];

    /// Stable key used in config and save files.
    fn key(self) -> &'static str;

    /// Reverse lookup through the key table.
    fn from_key(key: &str) -> Option<Self> {
        Self::all().iter().copied().find(|id| id.key() == key)
    }
}

/// Kinds of production units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Trowel,
    Digger,
    Excavator,
    DigSite,
    Expedition,
}

impl UnitKind {
    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            UnitKind::Trowel => "Trowel",
            UnitKind::Digger => "Digger",
            UnitKind::Excavator => "Excavator",
            UnitKind::DigSite => "Dig Site",
            UnitKind::Expedition => "Expedition",
        }
    }
}

impl CatalogId for UnitKind {
    fn all() -> &'static [UnitKind] {
        &[
            UnitKind::Trowel,
            UnitKind::Digger,
            UnitKind::Excavator,
            UnitKind::DigSite,
            UnitKind::Expedition,
        ]
    }

    fn key(self) -> &'static str {
        match self {
            UnitKind::Trowel => "trowel",
            UnitKind::Digger => "digger",
            UnitKind::Excavator => "excavator",
            UnitKind::DigSite => "dig_site",
            UnitKind::Expedition => "expedition",
        }
    }
}

/// Leveled upgrades, each boosting one unit kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeId {
    TemperedBlades,
    SturdyBoots,
    Hydraulics,
    SurveyMaps,
    Patronage,
}

impl UpgradeId {
    pub fn name(self) -> &'static str {
        match self {
            UpgradeId::TemperedBlades => "Tempered Blades",
            UpgradeId::SturdyBoots => "Sturdy Boots",
            UpgradeId::Hydraulics => "Hydraulics",
            UpgradeId::SurveyMaps => "Survey Maps",
            UpgradeId::Patronage => "Patronage",
        }
    }
}

impl CatalogId for UpgradeId {
    fn all() -> &'static [UpgradeId] {
        &[
            UpgradeId::TemperedBlades,
            UpgradeId::SturdyBoots,
            UpgradeId::Hydraulics,
            UpgradeId::SurveyMaps,
            UpgradeId::Patronage,
        ]
    }

    fn key(self) -> &'static str {
        match self {
            UpgradeId::TemperedBlades => "tempered_blades",
            UpgradeId::SturdyBoots => "sturdy_boots",
            UpgradeId::Hydraulics => "hydraulics",
            UpgradeId::SurveyMaps => "survey_maps",
            UpgradeId::Patronage => "patronage",
        }
    }
}

/// Permanent unlockables gated on prestige count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactId {
    GoldenIdol,
    CrackedCompass,
    AncientGauntlet,
    MerchantSeal,
    ObsidianMirror,
    FoundersCharter,
    EternalHourglass,
}

impl ArtifactId {
    pub fn name(self) -> &'static str {
        match self {
            ArtifactId::GoldenIdol => "Golden Idol",
            ArtifactId::CrackedCompass => "Cracked Compass",
            ArtifactId::AncientGauntlet => "Ancient Gauntlet",
            ArtifactId::MerchantSeal => "Merchant Seal",
            ArtifactId::ObsidianMirror => "Obsidian Mirror",
            ArtifactId::FoundersCharter => "Founder's Charter",
            ArtifactId::EternalHourglass => "Eternal Hourglass",
        }
    }
}

impl CatalogId for ArtifactId {
    fn all() -> &'static [ArtifactId] {
        &[
            ArtifactId::GoldenIdol,
            ArtifactId::CrackedCompass,
            ArtifactId::AncientGauntlet,
            ArtifactId::MerchantSeal,
            ArtifactId::ObsidianMirror,
            ArtifactId::FoundersCharter,
            ArtifactId::EternalHourglass,
        ]
    }

    fn key(self) -> &'static str {
        match self {
            ArtifactId::GoldenIdol => "golden_idol",
            ArtifactId::CrackedCompass => "cracked_compass",
            ArtifactId::AncientGauntlet => "ancient_gauntlet",
            ArtifactId::MerchantSeal => "merchant_seal",
            ArtifactId::ObsidianMirror => "obsidian_mirror",
            ArtifactId::FoundersCharter => "founders_charter",
            ArtifactId::EternalHourglass => "eternal_hourglass",
        }
    }
}

/// Which income stream a unit feeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YieldTarget {
    Click,
    Passive,
}

/// Parameters of a cost curve: `base * (1 + rate * n^exponent)`.
pub trait CostCurve {
    fn base_cost(&self) -> f64;
    fn growth_rate(&self) -> f64;
    fn growth_exponent(&self) -> f64;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    pub base_click_yield: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitConfig {
    pub base_cost: f64,
    pub cost_growth_rate: f64,
    pub cost_growth_exponent: f64,
    pub base_yield_per_unit: f64,
    pub yield_applies_to: YieldTarget,
}

impl CostCurve for UnitConfig {
    fn base_cost(&self) -> f64 {
        self.base_cost
    }
    fn growth_rate(&self) -> f64 {
        self.cost_growth_rate
    }
    fn growth_exponent(&self) -> f64 {
        self.cost_growth_exponent
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpgradeConfig {
    pub base_cost: f64,
    pub cost_growth_rate: f64,
    pub cost_growth_exponent: f64,
    /// Each level multiplies the target's yield rate by `1 + this`.
    pub effect_multiplier_per_level: f64,
    pub target_unit_kind: UnitKind,
}

impl CostCurve for UpgradeConfig {
    fn base_cost(&self) -> f64 {
        self.base_cost
    }
    fn growth_rate(&self) -> f64 {
        self.cost_growth_rate
    }
    fn growth_exponent(&self) -> f64 {
        self.cost_growth_exponent
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrestigeConfig {
    /// Lifetime currency needed before prestige is offered.
    pub unlock_threshold: f64,
    pub points_divisor: f64,
    /// Multiplier gained per prestige point.
    pub bonus_per_point: f64,
}

/// Data-driven artifact effect, applied by the artifact pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArtifactEffect {
    /// Multiplies all currency income.
    CurrencyMultiplier { magnitude: f64 },
    ClickMultiplier { magnitude: f64 },
    PassiveMultiplier { magnitude: f64 },
    /// Fraction shaved off every price, in `[0, 1)`.
    UnitCostReduction { magnitude: f64 },
    /// Currency granted at the start of each prestige cycle.
    StartingCurrency { magnitude: f64 },
    StartingUnits {
        magnitude: u64,
        target_unit_kind: UnitKind,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtifactConfig {
    pub unlock_at_prestige_count: u32,
    /// Display tier for hosts (sorting, badges). The engine never reads it.
    pub rarity_rank: u8,
    pub effect: ArtifactEffect,
}

/// The complete balance table. Read-only once validated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BalanceConfig {
    pub general: GeneralConfig,
    pub units: BTreeMap<UnitKind, UnitConfig>,
    pub upgrades: BTreeMap<UpgradeId, UpgradeConfig>,
    pub prestige: PrestigeConfig,
    pub artifacts: BTreeMap<ArtifactId, ArtifactConfig>,
}

impl BalanceConfig {
    /// Parse and validate a balance table.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: BalanceConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// The embedded balance table, parsed once per process.
    pub fn embedded() -> Result<Arc<BalanceConfig>, ConfigError> {
        static EMBEDDED: OnceLock<Result<Arc<BalanceConfig>, String>> = OnceLock::new();
        EMBEDDED
            .get_or_init(|| {
                BalanceConfig::from_json(EMBEDDED_BALANCE)
                    .map(Arc::new)
                    .map_err(|e| e.to_string())
            })
            .clone()
            .map_err(ConfigError::Embedded)
    }

    pub fn unit(&self, kind: UnitKind) -> Result<&UnitConfig, EconomyError> {
        self.units
            .get(&kind)
            .ok_or_else(|| EconomyError::InvalidItemKind(kind.key().to_string()))
    }

    pub fn upgrade(&self, id: UpgradeId) -> Result<&UpgradeConfig, EconomyError> {
        self.upgrades
            .get(&id)
            .ok_or_else(|| EconomyError::InvalidItemKind(id.key().to_string()))
    }

    pub fn artifact(&self, id: ArtifactId) -> Result<&ArtifactConfig, EconomyError> {
        self.artifacts
            .get(&id)
            .ok_or_else(|| EconomyError::InvalidItemKind(id.key().to_string()))
    }

    /// Check every invariant the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("general.base_click_yield", self.general.base_click_yield)?;

        for kind in UnitKind::all() {
            let unit = self
                .units
                .get(kind)
                .ok_or(ConfigError::MissingUnit(kind.key()))?;
            validate_curve(kind.key(), unit)?;
            non_negative("base_yield_per_unit", unit.base_yield_per_unit)?;
        }

        for id in UpgradeId::all() {
            let upgrade = self
                .upgrades
                .get(id)
                .ok_or(ConfigError::MissingUpgrade(id.key()))?;
            validate_curve(id.key(), upgrade)?;
            non_negative("effect_multiplier_per_level", upgrade.effect_multiplier_per_level)?;
        }

        positive("prestige.points_divisor", self.prestige.points_divisor)?;
        non_negative("prestige.unlock_threshold", self.prestige.unlock_threshold)?;
        non_negative("prestige.bonus_per_point", self.prestige.bonus_per_point)?;

        for id in ArtifactId::all() {
            let artifact = self
                .artifacts
                .get(id)
                .ok_or(ConfigError::MissingArtifact(id.key()))?;
            match artifact.effect {
                ArtifactEffect::CurrencyMultiplier { magnitude }
                | ArtifactEffect::ClickMultiplier { magnitude }
                | ArtifactEffect::PassiveMultiplier { magnitude } => {
                    positive(id.key(), magnitude)?;
                }
                ArtifactEffect::UnitCostReduction { magnitude } => {
                    if !(0.0..1.0).contains(&magnitude) {
                        return Err(ConfigError::OutOfRange {
                            field: id.key(),
                            value: magnitude,
                        });
                    }
                }
                ArtifactEffect::StartingCurrency { magnitude } => {
                    non_negative(id.key(), magnitude)?;
                }
                ArtifactEffect::StartingUnits { .. } => {}
            }
        }

        Ok(())
    }
}

fn validate_curve(field: &'static str, curve: &impl CostCurve) -> Result<(), ConfigError> {
    positive(field, curve.base_cost())?;
    positive(field, curve.growth_rate())?;
    positive(field, curve.growth_exponent())?;
    Ok(())
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value })
    }
}
