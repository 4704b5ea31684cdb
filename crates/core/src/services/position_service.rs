use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::errors::CoreError;
use crate::models::holding::{HoldingPosition, UserId};
use crate::storage::StockStore;

/// Records simulated buys, merging repeated buys of a symbol into one
/// position at a weighted-average price.
///
/// The merge itself is pure business logic with no I/O. `add_to_portfolio`
/// wraps it in a read-merge-write against the store.
pub struct PositionService;

impl PositionService {
    pub fn new() -> Self {
        Self
    }

    /// Merge a buy of `quantity` shares at `price` into `existing`.
    ///
    /// - No existing position: a new one opened at `now`.
    /// - Existing position: quantities add up, the average price becomes
    ///   `(q₀·p₀ + q·p) / (q₀ + q)`, `purchase_date` and `id` are kept and
    ///   only `last_updated` moves to `now`.
    ///
    /// Both `quantity` and `price` must be strictly positive. Decimal
    /// arithmetic keeps the average exact up to 28 significant digits; a
    /// merge whose totals leave `Decimal`'s range is a validation error.
    pub fn merge_buy(
        &self,
        existing: Option<&HoldingPosition>,
        user_id: UserId,
        symbol: &str,
        quantity: Decimal,
        price: Decimal,
        now: DateTime<Utc>,
    ) -> Result<HoldingPosition, CoreError> {
        Self::validate_buy(quantity, price)?;

        let Some(existing) = existing else {
            return Ok(HoldingPosition::open(user_id, symbol, quantity, price, now));
        };

        let overflow = || {
            CoreError::Validation(format!(
                "Buying {quantity} {} at {price} would exceed the representable position size",
                existing.symbol
            ))
        };
        let new_quantity = existing.quantity.checked_add(quantity).ok_or_else(overflow)?;
        let new_cost = existing
            .cost_basis()
            .zip(quantity.checked_mul(price))
            .and_then(|(held, bought)| held.checked_add(bought))
            .ok_or_else(overflow)?;
        let new_price = new_cost.checked_div(new_quantity).ok_or_else(overflow)?;

        Ok(HoldingPosition {
            quantity: new_quantity,
            purchase_price: new_price,
            last_updated: now,
            ..existing.clone()
        })
    }

    /// Record a buy for `user_id` in the store.
    ///
    /// Validation happens before the store is read, so a rejected buy never
    /// touches it. The caller's `&mut` borrow of the store keeps the
    /// read-merge-write for this `(user, symbol)` from interleaving.
    pub fn add_to_portfolio(
        &self,
        store: &mut dyn StockStore,
        user_id: UserId,
        symbol: &str,
        quantity: Decimal,
        price: Decimal,
        now: DateTime<Utc>,
    ) -> Result<HoldingPosition, CoreError> {
        Self::validate_buy(quantity, price)?;

        let existing = store.find_holding(user_id, symbol)?;
        let merged = self.merge_buy(existing.as_ref(), user_id, symbol, quantity, price, now)?;
        store.upsert_holding(merged.clone())?;

        tracing::info!(
            user_id,
            symbol = %merged.symbol,
            %quantity,
            %price,
            total_quantity = %merged.quantity,
            "recorded buy"
        );
        Ok(merged)
    }

    /// Reject non-positive quantities and prices.
    pub fn validate_buy(quantity: Decimal, price: Decimal) -> Result<(), CoreError> {
        if quantity <= Decimal::ZERO {
            return Err(CoreError::Validation(format!(
                "Quantity must be positive, got {quantity}"
            )));
        }
        if price <= Decimal::ZERO {
            return Err(CoreError::Validation(format!(
                "Purchase price must be positive, got {price}"
            )));
        }
        Ok(())
    }
}

impl Default for PositionService {
    fn default() -> Self {
        Self::new()
    }
}
