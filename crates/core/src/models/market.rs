use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::stock::StockRecord;

/// Market-wide statistics over every tracked stock.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    pub total_stocks: usize,

    /// Mean current price, 0 when nothing is tracked
    pub avg_price: Decimal,

    pub total_volume: u64,

    /// Records with price_change_percent > 0
    pub gainers: usize,

    /// Records with price_change_percent < 0
    pub losers: usize,
}

/// Best and worst performers, already ordered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopMovers {
    /// Highest price_change_percent first
    pub gainers: Vec<StockRecord>,

    /// Most negative price_change_percent first
    pub losers: Vec<StockRecord>,
}

impl TopMovers {
    /// Keep at most `n` of each list.
    pub fn truncated(mut self, n: usize) -> Self {
        self.gainers.truncate(n);
        self.losers.truncate(n);
        self
    }
}

/// Summary plus movers, as served to an overview endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketOverview {
    pub summary: MarketSummary,
    pub movers: TopMovers,
}

/// Everything the landing page shows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    /// The configured popular symbols that could be resolved, in config order
    pub stocks: Vec<StockRecord>,
    pub summary: MarketSummary,
    pub movers: TopMovers,
}
