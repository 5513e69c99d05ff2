//! Prestige: convert lifetime earnings into permanent points, unlock artifacts
//! and soft-reset the cycle.

use log::info;

use super::artifacts::{newly_unlockable, recompute_modifiers};
use super::config::{ArtifactId, BalanceConfig, CatalogId, UnitKind, UpgradeId};
use super::error::EconomyError;
use super::state::{base_yield_rates, prestige_multiplier_for, EconomyState};

/// What a completed prestige produced, for the caller to announce.
#[derive(Clone, Debug, PartialEq)]
pub struct PrestigeOutcome {
    pub award: u64,
    pub prestige_currency: u64,
    pub prestige_multiplier: f64,
    pub total_prestige_count: u32,
    pub newly_unlocked: Vec<ArtifactId>,
}

/// `floor(sqrt(lifetime / divisor))`, zero for an empty cycle.
pub fn compute_prestige_award(config: &BalanceConfig, state: &EconomyState) -> u64 {
    if state.lifetime_currency <= 0.0 {
        return 0;
    }
    (state.lifetime_currency / config.prestige.points_divisor)
        .sqrt()
        .floor() as u64
}

pub fn can_prestige(config: &BalanceConfig, state: &EconomyState) -> bool {
    state.lifetime_currency >= config.prestige.unlock_threshold
}

/// Perform the prestige transition as one step.
///
/// Everything that can fail is computed before the state is touched, so an
/// error leaves the session exactly as it was.
pub fn execute_prestige(
    config: &BalanceConfig,
    state: &mut EconomyState,
) -> Result<PrestigeOutcome, EconomyError> {
    let award = compute_prestige_award(config, state);
    if award == 0 || !can_prestige(config, state) {
        return Err(EconomyError::PrestigeNotEligible {
            lifetime: state.lifetime_currency,
            threshold: config.prestige.unlock_threshold,
        });
    }

    let prestige_currency = state.prestige_currency.saturating_add(award);
    let total_prestige_count = state.total_prestige_count.saturating_add(1);
    let newly_unlocked = newly_unlockable(config, total_prestige_count, &state.unlocked_artifacts);
    let mut unlocked = state.unlocked_artifacts.clone();
    unlocked.extend(newly_unlocked.iter().copied());
    let modifiers = recompute_modifiers(config, &unlocked)?;

    state.prestige_currency = prestige_currency;
    state.prestige_multiplier = prestige_multiplier_for(config, prestige_currency);
    state.total_prestige_count = total_prestige_count;
    state.unlocked_artifacts = unlocked;
    state.modifiers = modifiers;
    reset_cycle(config, state);
    state.recompute_yields(config);

    for id in &newly_unlocked {
        info!("artifact unlocked: {}", id.name());
    }
    info!(
        "prestige #{}: +{} points ({} total), multiplier x{:.2}",
        state.total_prestige_count, award, state.prestige_currency, state.prestige_multiplier
    );

    Ok(PrestigeOutcome {
        award,
        prestige_currency: state.prestige_currency,
        prestige_multiplier: state.prestige_multiplier,
        total_prestige_count: state.total_prestige_count,
        newly_unlocked,
    })
}

/// Clear the per-cycle fields, seeding them from the artifact starting bonus.
fn reset_cycle(config: &BalanceConfig, state: &mut EconomyState) {
    let bonus = &state.modifiers.prestige_starting_bonus;
    state.currency = bonus.currency;
    state.lifetime_currency = 0.0;
    state.units_owned = UnitKind::all()
        .iter()
        .map(|k| (*k, bonus.units_owned.get(k).copied().unwrap_or(0)))
        .collect();
    state.upgrade_level = UpgradeId::all().iter().map(|u| (*u, 0)).collect();
    state.unit_yield_rate = base_yield_rates(config);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::config::tests::balance;
    use crate::economy::cost::Quantity;
    use crate::economy::logic::{purchase_units, purchase_upgrade};
    use crate::economy::state::ModifierAccumulator;

    #[test]
    fn award_of_one_million_is_one() {
        let config = balance();
        let mut state = EconomyState::new(&config);
        state.lifetime_currency = 1_000_000.0;
        assert_eq!(compute_prestige_award(&config, &state), 1);
    }

    #[test]
    fn award_is_floored_square_root() {
        let config = balance();
        let mut state = EconomyState::new(&config);
        state.lifetime_currency = 24_999_999.0;
        assert_eq!(compute_prestige_award(&config, &state), 4);
        state.lifetime_currency = 25_000_000.0;
        assert_eq!(compute_prestige_award(&config, &state), 5);
    }

    #[test]
    fn award_zero_for_empty_cycle() {
        let config = balance();
        let state = EconomyState::new(&config);
        assert_eq!(compute_prestige_award(&config, &state), 0);
        assert!(!can_prestige(&config, &state));
    }

    #[test]
    fn prestige_requires_threshold() {
        let config = balance();
        let mut state = EconomyState::new(&config);
        state.lifetime_currency = 999_999.0;
        state.currency = 999_999.0;
        let before = state.clone();
        let err = execute_prestige(&config, &mut state).unwrap_err();
        assert!(matches!(err, EconomyError::PrestigeNotEligible { .. }));
        assert_eq!(state, before);
    }

    #[test]
    fn prestige_resets_cycle_and_keeps_permanent_fields() {
        let config = balance();
        let mut state = EconomyState::new(&config);
        state.currency = 5_000_000.0;
        purchase_units(&config, &mut state, UnitKind::Digger, Quantity::Exact(20)).unwrap();
        purchase_upgrade(&config, &mut state, UpgradeId::SturdyBoots, Quantity::Exact(3)).unwrap();
        state.lifetime_currency = 4_000_000.0;
        state.display_uses_exponential_notation = true;

        let outcome = execute_prestige(&config, &mut state).unwrap();
        assert_eq!(outcome.award, 2);
        assert_eq!(state.prestige_currency, 2);
        assert!((state.prestige_multiplier - 1.2).abs() < 1e-12);
        assert_eq!(state.total_prestige_count, 1);

        assert_eq!(state.lifetime_currency, 0.0);
        assert_eq!(state.level(UpgradeId::SturdyBoots), 0);
        assert!((state.yield_rate(UnitKind::Digger) - 1.0).abs() < 1e-12);
        assert_eq!(state.units(UnitKind::Digger), 0);
        assert!(state.display_uses_exponential_notation);
    }

    #[test]
    fn first_prestige_unlocks_tier_one_artifacts() {
        let config = balance();
        let mut state = EconomyState::new(&config);
        state.lifetime_currency = 1_000_000.0;
        let outcome = execute_prestige(&config, &mut state).unwrap();
        assert_eq!(
            outcome.newly_unlocked,
            vec![ArtifactId::GoldenIdol, ArtifactId::CrackedCompass]
        );
        assert!(state.unlocked_artifacts.contains(&ArtifactId::GoldenIdol));
        // Starting bonus from the compass applies to the fresh cycle.
        assert!((state.currency - 500.0).abs() < 1e-12);
        assert!((state.modifiers.currency_multiplier - 1.25).abs() < 1e-12);
        // Click yield reflects prestige multiplier and artifact multiplier.
        assert!((state.click_yield - 1.0 * 1.1 * 1.25).abs() < 1e-12);
    }

    #[test]
    fn starting_units_bonus_seeds_counts() {
        let config = balance();
        let mut state = EconomyState::new(&config);
        state.total_prestige_count = 4;
        state.unlocked_artifacts = newly_unlockable(&config, 4, &Default::default())
            .into_iter()
            .collect();
        state.lifetime_currency = 1_000_000.0;
        let outcome = execute_prestige(&config, &mut state).unwrap();
        assert_eq!(outcome.newly_unlocked, vec![ArtifactId::FoundersCharter]);
        assert_eq!(state.units(UnitKind::Digger), 10);
        assert!(state.passive_yield_per_second > 0.0);
    }

    #[test]
    fn repeated_prestige_does_not_unlock_twice() {
        let config = balance();
        let mut state = EconomyState::new(&config);
        state.lifetime_currency = 1_000_000.0;
        execute_prestige(&config, &mut state).unwrap();
        state.lifetime_currency = 1_000_000.0;
        let outcome = execute_prestige(&config, &mut state).unwrap();
        assert_eq!(outcome.newly_unlocked, vec![ArtifactId::AncientGauntlet]);
        assert_eq!(state.unlocked_artifacts.len(), 3);
    }

    #[test]
    fn modifiers_match_full_recompute_after_prestige() {
        let config = balance();
        let mut state = EconomyState::new(&config);
        for _ in 0..5 {
            state.lifetime_currency = 2_000_000.0;
            execute_prestige(&config, &mut state).unwrap();
        }
        let fresh = recompute_modifiers(&config, &state.unlocked_artifacts).unwrap();
        assert_eq!(state.modifiers, fresh);
        assert_ne!(state.modifiers, ModifierAccumulator::identity());
    }
}
