//! Economy state definitions.

use std::collections::{BTreeMap, BTreeSet};

use super::config::{ArtifactId, BalanceConfig, CatalogId, UnitKind, UpgradeId, YieldTarget};

/// Starting values granted at the beginning of every prestige cycle.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StartingBonus {
    pub currency: f64,
    pub units_owned: BTreeMap<UnitKind, u64>,
}

/// Aggregate effect of every unlocked artifact. Always rebuilt from identity.
#[derive(Clone, Debug, PartialEq)]
pub struct ModifierAccumulator {
    pub currency_multiplier: f64,
    pub click_multiplier: f64,
    pub passive_multiplier: f64,
    /// Fraction removed from every price, in `[0, 1)`.
    pub unit_cost_reduction: f64,
    pub prestige_starting_bonus: StartingBonus,
}

impl ModifierAccumulator {
    /// No artifacts: multipliers at 1, no reduction, no starting bonus.
    pub fn identity() -> Self {
        Self {
            currency_multiplier: 1.0,
            click_multiplier: 1.0,
            passive_multiplier: 1.0,
            unit_cost_reduction: 0.0,
            prestige_starting_bonus: StartingBonus::default(),
        }
    }
}

impl Default for ModifierAccumulator {
    fn default() -> Self {
        Self::identity()
    }
}

/// Full state of one play session.
#[derive(Clone, Debug, PartialEq)]
pub struct EconomyState {
    /// Spendable balance.
    pub currency: f64,
    /// Earned during the current prestige cycle.
    pub lifetime_currency: f64,
    pub units_owned: BTreeMap<UnitKind, u64>,
    /// Per-unit production, base rate compounded by upgrade levels.
    pub unit_yield_rate: BTreeMap<UnitKind, f64>,
    pub upgrade_level: BTreeMap<UpgradeId, u64>,
    /// Derived. Currency per click.
    pub click_yield: f64,
    /// Derived. Currency per second from passive units.
    pub passive_yield_per_second: f64,
    pub prestige_currency: u64,
    /// Derived from `prestige_currency`.
    pub prestige_multiplier: f64,
    pub total_prestige_count: u32,
    pub unlocked_artifacts: BTreeSet<ArtifactId>,
    pub modifiers: ModifierAccumulator,
    pub display_uses_exponential_notation: bool,
}

impl EconomyState {
    /// Fresh session state derived from config.
    pub fn new(config: &BalanceConfig) -> Self {
        let mut state = Self {
            currency: 0.0,
            lifetime_currency: 0.0,
            units_owned: UnitKind::all().iter().map(|k| (*k, 0)).collect(),
            unit_yield_rate: base_yield_rates(config),
            upgrade_level: UpgradeId::all().iter().map(|u| (*u, 0)).collect(),
            click_yield: 0.0,
            passive_yield_per_second: 0.0,
            prestige_currency: 0,
            prestige_multiplier: 1.0,
            total_prestige_count: 0,
            unlocked_artifacts: BTreeSet::new(),
            modifiers: ModifierAccumulator::identity(),
            display_uses_exponential_notation: false,
        };
        state.recompute_yields(config);
        state
    }

    pub fn units(&self, kind: UnitKind) -> u64 {
        self.units_owned.get(&kind).copied().unwrap_or(0)
    }

    pub fn yield_rate(&self, kind: UnitKind) -> f64 {
        self.unit_yield_rate.get(&kind).copied().unwrap_or(0.0)
    }

    pub fn level(&self, id: UpgradeId) -> u64 {
        self.upgrade_level.get(&id).copied().unwrap_or(0)
    }

    /// Rebuild click and passive yields from owned counts, rates and modifiers.
    /// Never applied as deltas.
    pub fn recompute_yields(&mut self, config: &BalanceConfig) {
        let mut click = config.general.base_click_yield;
        let mut passive = 0.0;
        for (kind, unit) in &config.units {
            let produced = self.units(*kind) as f64 * self.yield_rate(*kind);
            match unit.yield_applies_to {
                YieldTarget::Click => click += produced,
                YieldTarget::Passive => passive += produced,
            }
        }

        let shared = self.prestige_multiplier * self.modifiers.currency_multiplier;
        self.click_yield = click * shared * self.modifiers.click_multiplier;
        self.passive_yield_per_second = passive * shared * self.modifiers.passive_multiplier;
    }

    /// Credit earned currency to both the balance and the cycle total.
    pub fn earn(&mut self, amount: f64) {
        if amount <= 0.0 {
            return;
        }
        self.currency += amount;
        self.lifetime_currency += amount;
    }
}

/// Base yield for every unit kind, straight from config.
pub fn base_yield_rates(config: &BalanceConfig) -> BTreeMap<UnitKind, f64> {
    config
        .units
        .iter()
        .map(|(kind, unit)| (*kind, unit.base_yield_per_unit))
        .collect()
}

/// Yield rates implied by upgrade levels alone, for validating loaded saves.
pub fn expected_yield_rates(
    config: &BalanceConfig,
    levels: &BTreeMap<UpgradeId, u64>,
) -> BTreeMap<UnitKind, f64> {
    let mut rates = base_yield_rates(config);
    for (id, upgrade) in &config.upgrades {
        let level = levels.get(id).copied().unwrap_or(0);
        if level == 0 {
            continue;
        }
        if let Some(rate) = rates.get_mut(&upgrade.target_unit_kind) {
            *rate *= (1.0 + upgrade.effect_multiplier_per_level).powf(level as f64);
        }
    }
    rates
}

/// `1 + points * bonus_per_point`.
pub fn prestige_multiplier_for(config: &BalanceConfig, points: u64) -> f64 {
    1.0 + points as f64 * config.prestige.bonus_per_point
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::config::tests::balance;

    #[test]
    fn new_state_has_every_kind_at_zero() {
        let config = balance();
        let state = EconomyState::new(&config);
        for kind in UnitKind::all() {
            assert_eq!(state.units(*kind), 0);
            assert!(
                (state.yield_rate(*kind) - config.units[kind].base_yield_per_unit).abs() < 1e-12
            );
        }
        for id in UpgradeId::all() {
            assert_eq!(state.level(*id), 0);
        }
        assert!((state.prestige_multiplier - 1.0).abs() < f64::EPSILON);
        assert_eq!(state.modifiers, ModifierAccumulator::identity());
    }

    #[test]
    fn new_state_click_yield_is_base() {
        let config = balance();
        let state = EconomyState::new(&config);
        assert!((state.click_yield - config.general.base_click_yield).abs() < 1e-12);
        assert!(state.passive_yield_per_second.abs() < 1e-12);
    }

    #[test]
    fn passive_yield_sums_owned_times_rate() {
        let config = balance();
        let mut state = EconomyState::new(&config);
        state.units_owned.insert(UnitKind::Digger, 10);
        state.units_owned.insert(UnitKind::Excavator, 3);
        state.recompute_yields(&config);
        let expected = 10.0 * 1.0 + 3.0 * 8.0;
        assert!((state.passive_yield_per_second - expected).abs() < 1e-9);
    }

    #[test]
    fn click_units_feed_click_yield() {
        let config = balance();
        let mut state = EconomyState::new(&config);
        state.units_owned.insert(UnitKind::Trowel, 4);
        state.recompute_yields(&config);
        assert!((state.click_yield - 5.0).abs() < 1e-9);
        assert!(state.passive_yield_per_second.abs() < 1e-12);
    }

    #[test]
    fn multipliers_scale_yields() {
        let config = balance();
        let mut state = EconomyState::new(&config);
        state.units_owned.insert(UnitKind::Digger, 10);
        state.prestige_multiplier = 2.0;
        state.modifiers.currency_multiplier = 1.5;
        state.modifiers.passive_multiplier = 2.0;
        state.modifiers.click_multiplier = 3.0;
        state.recompute_yields(&config);
        assert!((state.passive_yield_per_second - 10.0 * 2.0 * 1.5 * 2.0).abs() < 1e-9);
        assert!((state.click_yield - 1.0 * 2.0 * 1.5 * 3.0).abs() < 1e-9);
    }

    #[test]
    fn recompute_is_stable() {
        let config = balance();
        let mut state = EconomyState::new(&config);
        state.units_owned.insert(UnitKind::DigSite, 7);
        state.recompute_yields(&config);
        let first = state.clone();
        state.recompute_yields(&config);
        assert_eq!(state, first);
    }

    #[test]
    fn expected_rates_compound_levels() {
        let config = balance();
        let mut levels = BTreeMap::new();
        levels.insert(UpgradeId::SturdyBoots, 3);
        let rates = expected_yield_rates(&config, &levels);
        assert!((rates[&UnitKind::Digger] - 1.1f64.powi(3)).abs() < 1e-9);
        assert!((rates[&UnitKind::Excavator] - 8.0).abs() < 1e-12);
    }

    #[test]
    fn earn_ignores_non_positive() {
        let config = balance();
        let mut state = EconomyState::new(&config);
        state.earn(-5.0);
        state.earn(0.0);
        assert_eq!(state.currency, 0.0);
        state.earn(2.5);
        assert!((state.lifetime_currency - 2.5).abs() < 1e-12);
    }

    #[test]
    fn prestige_multiplier_formula() {
        let config = balance();
        assert!((prestige_multiplier_for(&config, 0) - 1.0).abs() < 1e-12);
        assert!((prestige_multiplier_for(&config, 5) - 1.5).abs() < 1e-12);
    }
}
