//! Cost model: pure pricing functions shared by single and bulk purchases.
//!
//! Price of the n-th item: `floor(base * (1 + rate * n^exponent))`, then the
//! artifact cost reduction is applied and floored again. Bulk prices are always
//! the exact sum of per-step prices.

use super::config::{BalanceConfig, CostCurve, UnitKind, UpgradeId};
use super::error::EconomyError;

/// Upper bound on steps examined by a single "max" search.
pub const MAX_BULK_STEPS: u64 = 1_000_000;

/// Anything with a price curve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Item {
    Unit(UnitKind),
    Upgrade(UpgradeId),
}

impl Item {
    /// The curve for this item. Missing entries fail loudly instead of pricing at zero.
    pub fn curve(self, config: &BalanceConfig) -> Result<&dyn CostCurve, EconomyError> {
        let curve: &dyn CostCurve = match self {
            Item::Unit(kind) => config.unit(kind)?,
            Item::Upgrade(id) => config.upgrade(id)?,
        };
        Ok(curve)
    }
}

/// How many to buy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quantity {
    Exact(u64),
    /// As many as the balance allows.
    Max,
}

/// A resolved purchase: how many, and for how much.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PurchaseQuote {
    pub count: u64,
    pub total_cost: u64,
}

/// Price of the step bought when `owned` are already held. Saturates at
/// `u64::MAX` for prices past the integer range.
pub fn step_cost(curve: &dyn CostCurve, owned: u64, cost_reduction: f64) -> u64 {
    let growth = curve.growth_rate() * (owned as f64).powf(curve.growth_exponent());
    let raw = (curve.base_cost() * (1.0 + growth)).floor();
    (raw * (1.0 - cost_reduction)).floor() as u64
}

/// Price of step `owned + i`. `None` when buying it would push the owned
/// count or the price past the integer range, which makes the step unpayable.
fn payable_step(curve: &dyn CostCurve, owned: u64, i: u64, cost_reduction: f64) -> Option<u64> {
    let index = owned.checked_add(i).filter(|n| *n < u64::MAX)?;
    let price = step_cost(curve, index, cost_reduction);
    (price < u64::MAX).then_some(price)
}

/// Sum of `quantity` consecutive step prices starting at `owned`.
///
/// Requests longer than [`MAX_BULK_STEPS`], or whose total leaves the integer
/// range, are priced at `u64::MAX` and can never be paid.
pub fn bulk_cost(curve: &dyn CostCurve, owned: u64, quantity: u64, cost_reduction: f64) -> u64 {
    if quantity > MAX_BULK_STEPS {
        return u64::MAX;
    }
    let mut total = 0u64;
    for i in 0..quantity {
        match payable_step(curve, owned, i, cost_reduction).and_then(|p| total.checked_add(p)) {
            Some(next) => total = next,
            None => return u64::MAX,
        }
    }
    total
}

/// Like [`bulk_cost`], but stops as soon as the running total passes
/// `available`. `Err` carries the total reached, a lower bound on the price.
pub fn bulk_cost_within(
    curve: &dyn CostCurve,
    owned: u64,
    quantity: u64,
    cost_reduction: f64,
    available: f64,
) -> Result<u64, u64> {
    if quantity > MAX_BULK_STEPS {
        return Err(u64::MAX);
    }
    let mut total = 0u64;
    for i in 0..quantity {
        total = payable_step(curve, owned, i, cost_reduction)
            .and_then(|p| total.checked_add(p))
            .ok_or(u64::MAX)?;
        if total as f64 > available {
            return Err(total);
        }
    }
    Ok(total)
}

/// Greedily buy steps while the running total stays within `available`.
pub fn max_affordable(
    curve: &dyn CostCurve,
    owned: u64,
    available: f64,
    cost_reduction: f64,
) -> PurchaseQuote {
    let mut quote = PurchaseQuote::default();
    while quote.count < MAX_BULK_STEPS {
        let Some(total) = payable_step(curve, owned, quote.count, cost_reduction)
            .and_then(|p| quote.total_cost.checked_add(p))
        else {
            break;
        };
        if total as f64 > available {
            break;
        }
        quote.total_cost = total;
        quote.count += 1;
    }
    quote
}

/// Price of one `item` when `owned` are held.
pub fn unit_cost(
    config: &BalanceConfig,
    item: Item,
    owned: u64,
    cost_reduction: f64,
) -> Result<u64, EconomyError> {
    Ok(step_cost(item.curve(config)?, owned, cost_reduction))
}

/// Price a requested quantity for display. An exact quote may exceed
/// `available`; unpayable requests quote `u64::MAX`.
pub fn resolve_quantity(
    config: &BalanceConfig,
    item: Item,
    owned: u64,
    quantity: Quantity,
    available: f64,
    cost_reduction: f64,
) -> Result<PurchaseQuote, EconomyError> {
    let curve = item.curve(config)?;
    Ok(match quantity {
        Quantity::Exact(count) => PurchaseQuote {
            count,
            total_cost: bulk_cost(curve, owned, count, cost_reduction),
        },
        Quantity::Max => max_affordable(curve, owned, available, cost_reduction),
    })
}

/// Price a request that is about to be paid from `available`.
///
/// Returns a non-empty quote no larger than `available`, or
/// `InsufficientFunds`. Exact requests stop pricing at the first step the
/// balance cannot cover, so `needed` may be a lower bound.
pub fn price_purchase(
    config: &BalanceConfig,
    item: Item,
    owned: u64,
    quantity: Quantity,
    available: f64,
    cost_reduction: f64,
) -> Result<PurchaseQuote, EconomyError> {
    let curve = item.curve(config)?;
    let quote = match quantity {
        Quantity::Exact(count) => {
            let total_cost = bulk_cost_within(curve, owned, count, cost_reduction, available)
                .map_err(|needed| EconomyError::InsufficientFunds { needed, available })?;
            PurchaseQuote { count, total_cost }
        }
        Quantity::Max => max_affordable(curve, owned, available, cost_reduction),
    };
    if quote.count == 0 {
        return Err(EconomyError::InsufficientFunds {
            needed: step_cost(curve, owned, cost_reduction),
            available,
        });
    }
    Ok(quote)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::economy::config::{UnitConfig, YieldTarget};
    use proptest::prelude::*;

    fn arb_curve() -> impl Strategy<Value = UnitConfig> {
        (10.0f64..1e5, 0.01f64..2.0, 0.1f64..2.0).prop_map(|(base, rate, exponent)| UnitConfig {
            base_cost: base,
            cost_growth_rate: rate,
            cost_growth_exponent: exponent,
            base_yield_per_unit: 1.0,
            yield_applies_to: YieldTarget::Passive,
        })
    }

    proptest! {
        #[test]
        fn prop_step_cost_monotonic(
            c in arb_curve(),
            owned in 0u64..10_000,
            reduction in 0.0f64..0.9,
        ) {
            prop_assert!(step_cost(&c, owned + 1, reduction) >= step_cost(&c, owned, reduction));
        }

        #[test]
        fn prop_bulk_cost_additive(
            c in arb_curve(),
            owned in 0u64..1_000,
            a in 0u64..50,
            b in 0u64..50,
            reduction in 0.0f64..0.9,
        ) {
            prop_assert_eq!(
                bulk_cost(&c, owned, a + b, reduction),
                bulk_cost(&c, owned, a, reduction) + bulk_cost(&c, owned + a, b, reduction)
            );
        }

        #[test]
        fn prop_max_affordable_sound(
            c in arb_curve(),
            owned in 0u64..1_000,
            available in 0.0f64..1e5,
            reduction in 0.0f64..0.9,
        ) {
            let quote = max_affordable(&c, owned, available, reduction);
            prop_assert_eq!(quote.total_cost, bulk_cost(&c, owned, quote.count, reduction));
            prop_assert!(quote.total_cost as f64 <= available);
            prop_assert!(bulk_cost(&c, owned, quote.count + 1, reduction) as f64 > available);
        }

        #[test]
        fn prop_within_agrees_with_bulk(
            c in arb_curve(),
            owned in prop_oneof![0u64..1_000, (u64::MAX - 100)..=u64::MAX],
            quantity in 0u64..200,
            available in 0.0f64..1e7,
            reduction in 0.0f64..0.9,
        ) {
            let full = bulk_cost(&c, owned, quantity, reduction);
            match bulk_cost_within(&c, owned, quantity, reduction, available) {
                Ok(total) => {
                    prop_assert_eq!(total, full);
                    prop_assert!(total as f64 <= available);
                }
                Err(partial) => {
                    prop_assert!(full as f64 > available);
                    prop_assert!(partial <= full);
                }
            }
        }
    }
}
