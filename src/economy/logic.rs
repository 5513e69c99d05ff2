//! Economy game logic: purchases, clicks and passive income. Pure functions
//! over `(config, state)`, fully testable.

use log::debug;

use super::config::{BalanceConfig, CatalogId, UnitKind, UpgradeId};
use super::cost::{price_purchase, resolve_quantity, Item, PurchaseQuote, Quantity};
use super::error::EconomyError;
use super::state::EconomyState;

/// Price `quantity` units without buying them.
pub fn quote_units(
    config: &BalanceConfig,
    state: &EconomyState,
    kind: UnitKind,
    quantity: Quantity,
) -> Result<PurchaseQuote, EconomyError> {
    quote(config, state, Item::Unit(kind), quantity)
}

/// Price `quantity` upgrade levels without buying them.
pub fn quote_upgrade(
    config: &BalanceConfig,
    state: &EconomyState,
    id: UpgradeId,
    quantity: Quantity,
) -> Result<PurchaseQuote, EconomyError> {
    quote(config, state, Item::Upgrade(id), quantity)
}

fn quote(
    config: &BalanceConfig,
    state: &EconomyState,
    item: Item,
    quantity: Quantity,
) -> Result<PurchaseQuote, EconomyError> {
    resolve_quantity(
        config,
        item,
        held(state, item),
        quantity,
        state.currency,
        state.modifiers.unit_cost_reduction,
    )
}

fn held(state: &EconomyState, item: Item) -> u64 {
    match item {
        Item::Unit(kind) => state.units(kind),
        Item::Upgrade(id) => state.level(id),
    }
}

/// Price a purchase against the current balance. Nothing is mutated.
fn checkout(
    config: &BalanceConfig,
    state: &EconomyState,
    item: Item,
    quantity: Quantity,
) -> Result<(PurchaseQuote, u64), EconomyError> {
    let owned = held(state, item);
    let quote = price_purchase(
        config,
        item,
        owned,
        quantity,
        state.currency,
        state.modifiers.unit_cost_reduction,
    )?;
    let after = owned
        .checked_add(quote.count)
        .ok_or(EconomyError::InsufficientFunds {
            needed: u64::MAX,
            available: state.currency,
        })?;
    Ok((quote, after))
}

/// Buy units. All-or-nothing: on error the state is untouched.
pub fn purchase_units(
    config: &BalanceConfig,
    state: &mut EconomyState,
    kind: UnitKind,
    quantity: Quantity,
) -> Result<PurchaseQuote, EconomyError> {
    let (quote, owned) = checkout(config, state, Item::Unit(kind), quantity)?;

    state.currency -= quote.total_cost as f64;
    state.units_owned.insert(kind, owned);
    state.recompute_yields(config);

    debug!(
        "bought {} x{} for {} ({} owned)",
        kind.name(),
        quote.count,
        quote.total_cost,
        owned
    );
    Ok(quote)
}

/// Buy upgrade levels; the target's yield rate compounds once per transaction.
pub fn purchase_upgrade(
    config: &BalanceConfig,
    state: &mut EconomyState,
    id: UpgradeId,
    quantity: Quantity,
) -> Result<PurchaseQuote, EconomyError> {
    let upgrade = config.upgrade(id)?;
    let target = upgrade.target_unit_kind;
    if !state.unit_yield_rate.contains_key(&target) {
        return Err(EconomyError::InvalidItemKind(target.key().to_string()));
    }

    let (quote, level) = checkout(config, state, Item::Upgrade(id), quantity)?;

    state.currency -= quote.total_cost as f64;
    state.upgrade_level.insert(id, level);
    let factor = (1.0 + upgrade.effect_multiplier_per_level).powf(quote.count as f64);
    if let Some(rate) = state.unit_yield_rate.get_mut(&target) {
        *rate *= factor;
    }
    state.recompute_yields(config);

    debug!(
        "upgraded {} +{} to level {} for {}",
        id.name(),
        quote.count,
        level,
        quote.total_cost
    );
    Ok(quote)
}

/// Manual click. Returns the currency earned.
pub fn click(state: &mut EconomyState) -> f64 {
    let earned = state.click_yield;
    state.earn(earned);
    earned
}

/// Credit passive income for `elapsed_seconds`. Returns the currency earned.
pub fn tick_passive_income(state: &mut EconomyState, elapsed_seconds: f64) -> f64 {
    if !elapsed_seconds.is_finite() || elapsed_seconds <= 0.0 {
        return 0.0;
    }
    let earned = state.passive_yield_per_second * elapsed_seconds;
    state.earn(earned);
    earned
}
