use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of the user owning a holding or watchlist entry.
pub type UserId = i64;

/// A user's simulated position in one symbol.
///
/// There is at most one position per `(user_id, symbol)`: repeated buys are
/// merged into it at a weighted-average price rather than stored separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingPosition {
    /// Document id, stable across merges
    pub id: Uuid,

    pub user_id: UserId,

    /// Uppercase ticker. Soft reference to a `StockRecord`.
    pub symbol: String,

    /// Shares held (always > 0)
    pub quantity: Decimal,

    /// Weighted-average price paid per share
    pub purchase_price: Decimal,

    /// When the position was first opened
    pub purchase_date: DateTime<Utc>,

    pub last_updated: DateTime<Utc>,
}

impl HoldingPosition {
    pub fn open(
        user_id: UserId,
        symbol: impl Into<String>,
        quantity: Decimal,
        purchase_price: Decimal,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            symbol: symbol.into().to_uppercase(),
            quantity,
            purchase_price,
            purchase_date: at,
            last_updated: at,
        }
    }

    /// Total amount paid for the position (quantity × average price).
    /// None if the product exceeds `Decimal`'s range.
    pub fn cost_basis(&self) -> Option<Decimal> {
        self.quantity.checked_mul(self.purchase_price)
    }
}
