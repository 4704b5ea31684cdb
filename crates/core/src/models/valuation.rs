use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Valuation of a single holding against its latest stock record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionValuation {
    pub symbol: String,

    pub quantity: Decimal,

    /// Average price paid per share
    pub purchase_price: Decimal,

    /// Latest price from the stock record
    pub current_price: Decimal,

    /// quantity × current_price
    pub current_value: Decimal,

    /// quantity × purchase_price
    pub cost: Decimal,

    /// current_value − cost
    pub gain_loss: Decimal,

    /// gain_loss / cost × 100, 0 when cost is 0
    pub gain_loss_percent: Decimal,
}

/// A user's whole portfolio at current prices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioValuation {
    pub total_value: Decimal,
    pub total_cost: Decimal,
    pub total_gain_loss: Decimal,

    /// total_gain_loss / total_cost × 100, 0 when total_cost is 0
    pub total_gain_loss_percent: Decimal,

    /// Per-position breakdown, in holding order
    pub positions: Vec<PositionValuation>,

    /// Symbols held but missing from the stock store. These are left out of
    /// `positions` and of every total.
    #[serde(default)]
    pub unpriced_symbols: Vec<String>,
}

impl PortfolioValuation {
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
