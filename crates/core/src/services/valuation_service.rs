use rust_decimal::Decimal;

use crate::errors::CoreError;
use crate::models::holding::HoldingPosition;
use crate::models::stock::{checked_change_percent, StockRecord};
use crate::models::valuation::{PortfolioValuation, PositionValuation};

/// Values a user's holdings at the latest known prices.
///
/// Holdings whose symbol has no stock record are left out of the details
/// and of every total, and listed in `unpriced_symbols` instead. Any
/// product or sum that leaves `Decimal`'s range fails the whole valuation
/// with `CoreError::Validation`.
pub struct ValuationService;

impl ValuationService {
    pub fn new() -> Self {
        Self
    }

    /// Value `holdings`, resolving each symbol through `lookup`.
    pub fn value_portfolio<F>(
        &self,
        holdings: &[HoldingPosition],
        mut lookup: F,
    ) -> Result<PortfolioValuation, CoreError>
    where
        F: FnMut(&str) -> Option<StockRecord>,
    {
        let mut valuation = PortfolioValuation::default();

        for holding in holdings {
            let Some(stock) = lookup(&holding.symbol) else {
                tracing::debug!(symbol = %holding.symbol, "no stock record, position excluded");
                valuation.unpriced_symbols.push(holding.symbol.clone());
                continue;
            };

            let position = Self::value_position(holding, stock.current_price)?;
            let overflow = || overflow_error("portfolio total", &holding.symbol);
            valuation.total_value = valuation
                .total_value
                .checked_add(position.current_value)
                .ok_or_else(overflow)?;
            valuation.total_cost = valuation
                .total_cost
                .checked_add(position.cost)
                .ok_or_else(overflow)?;
            valuation.total_gain_loss = valuation
                .total_gain_loss
                .checked_add(position.gain_loss)
                .ok_or_else(overflow)?;
            valuation.positions.push(position);
        }

        valuation.total_gain_loss_percent =
            Self::percent_of_cost(valuation.total_gain_loss, valuation.total_cost)
                .ok_or_else(|| overflow_error("portfolio gain/loss percent", "all holdings"))?;
        Ok(valuation)
    }

    /// Value one holding at `current_price`.
    pub fn value_position(
        holding: &HoldingPosition,
        current_price: Decimal,
    ) -> Result<PositionValuation, CoreError> {
        let overflow = || overflow_error("position value", &holding.symbol);
        let current_value = holding.quantity.checked_mul(current_price).ok_or_else(overflow)?;
        let cost = holding.cost_basis().ok_or_else(overflow)?;
        let gain_loss = current_value.checked_sub(cost).ok_or_else(overflow)?;
        let gain_loss_percent = Self::percent_of_cost(gain_loss, cost).ok_or_else(overflow)?;
        Ok(PositionValuation {
            symbol: holding.symbol.clone(),
            quantity: holding.quantity,
            purchase_price: holding.purchase_price,
            current_price,
            current_value,
            cost,
            gain_loss,
            gain_loss_percent,
        })
    }

    // 0% for a non-positive cost
    fn percent_of_cost(gain_loss: Decimal, cost: Decimal) -> Option<Decimal> {
        if cost > Decimal::ZERO {
            checked_change_percent(gain_loss, cost)
        } else {
            Some(Decimal::ZERO)
        }
    }
}

impl Default for ValuationService {
    fn default() -> Self {
        Self::new()
    }
}

fn overflow_error(what: &str, symbol: &str) -> CoreError {
    CoreError::Validation(format!("{what} for {symbol} exceeds the representable range"))
}
