//! Artifact effect pipeline.
//!
//! Artifacts are pure data. The accumulator is rebuilt from identity every
//! time the unlocked set changes, so recomputing never stacks onto a previous
//! result.

use std::collections::BTreeSet;

use super::config::{ArtifactEffect, ArtifactId, BalanceConfig};
use super::error::EconomyError;
use super::state::ModifierAccumulator;

/// Build the accumulator for an unlocked artifact set.
pub fn recompute_modifiers(
    config: &BalanceConfig,
    unlocked: &BTreeSet<ArtifactId>,
) -> Result<ModifierAccumulator, EconomyError> {
    accumulate(config, unlocked.iter().copied())
}

/// Fold artifacts into a fresh accumulator. Input order is irrelevant.
pub fn accumulate(
    config: &BalanceConfig,
    artifacts: impl IntoIterator<Item = ArtifactId>,
) -> Result<ModifierAccumulator, EconomyError> {
    // Canonical order keeps float products bit-identical for any input order.
    let ordered: BTreeSet<ArtifactId> = artifacts.into_iter().collect();
    let mut acc = ModifierAccumulator::identity();
    for id in ordered {
        apply_effect(&mut acc, &config.artifact(id)?.effect);
    }
    Ok(acc)
}

fn apply_effect(acc: &mut ModifierAccumulator, effect: &ArtifactEffect) {
    match effect {
        ArtifactEffect::CurrencyMultiplier { magnitude } => acc.currency_multiplier *= magnitude,
        ArtifactEffect::ClickMultiplier { magnitude } => acc.click_multiplier *= magnitude,
        ArtifactEffect::PassiveMultiplier { magnitude } => acc.passive_multiplier *= magnitude,
        ArtifactEffect::UnitCostReduction { magnitude } => {
            // Reductions stack on the remaining price: 1 - (1-a)(1-b).
            acc.unit_cost_reduction = 1.0 - (1.0 - acc.unit_cost_reduction) * (1.0 - magnitude);
        }
        ArtifactEffect::StartingCurrency { magnitude } => {
            let bonus = &mut acc.prestige_starting_bonus;
            bonus.currency = bonus.currency.max(*magnitude);
        }
        ArtifactEffect::StartingUnits {
            magnitude,
            target_unit_kind,
        } => {
            let slot = acc
                .prestige_starting_bonus
                .units_owned
                .entry(*target_unit_kind)
                .or_insert(0);
            *slot = (*slot).max(*magnitude);
        }
    }
}

/// Artifacts whose prestige gate is met but are not yet unlocked.
pub fn newly_unlockable(
    config: &BalanceConfig,
    prestige_count: u32,
    unlocked: &BTreeSet<ArtifactId>,
) -> Vec<ArtifactId> {
    config
        .artifacts
        .iter()
        .filter(|(id, artifact)| {
            artifact.unlock_at_prestige_count <= prestige_count && !unlocked.contains(*id)
        })
        .map(|(id, _)| *id)
        .collect()
}
