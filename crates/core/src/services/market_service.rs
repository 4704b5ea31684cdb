use rust_decimal::Decimal;

use crate::models::market::{MarketSummary, TopMovers};
use crate::models::stock::StockRecord;

/// Default number of gainers/losers returned by `top_movers`.
pub const DEFAULT_TOP_N: usize = 5;

/// Market-wide statistics and gainer/loser rankings over tracked stocks.
pub struct MarketService;

impl MarketService {
    pub fn new() -> Self {
        Self
    }

    /// Count, mean price, total volume and gainer/loser counts.
    /// An empty slice yields an all-zero summary.
    pub fn summarize(&self, stocks: &[StockRecord]) -> MarketSummary {
        if stocks.is_empty() {
            return MarketSummary::default();
        }

        let total_price: Decimal = stocks.iter().map(|s| s.current_price).sum();
        MarketSummary {
            total_stocks: stocks.len(),
            avg_price: total_price / Decimal::from(stocks.len()),
            total_volume: stocks.iter().fold(0u64, |acc, s| acc.saturating_add(s.volume)),
            gainers: stocks.iter().filter(|s| s.is_gainer()).count(),
            losers: stocks.iter().filter(|s| s.is_loser()).count(),
        }
    }

    /// Up to `n` gainers (highest percent first) and `n` losers (most
    /// negative first). Unchanged stocks appear in neither list; equal
    /// percents keep their order in `stocks`.
    pub fn top_movers(&self, stocks: &[StockRecord], n: usize) -> TopMovers {
        let mut gainers: Vec<StockRecord> =
            stocks.iter().filter(|s| s.is_gainer()).cloned().collect();
        // sort_by is stable, which gives the tie order
        gainers.sort_by(|a, b| b.price_change_percent.cmp(&a.price_change_percent));
        gainers.truncate(n);

        let mut losers: Vec<StockRecord> =
            stocks.iter().filter(|s| s.is_loser()).cloned().collect();
        losers.sort_by(|a, b| a.price_change_percent.cmp(&b.price_change_percent));
        losers.truncate(n);

        TopMovers { gainers, losers }
    }
}

impl Default for MarketService {
    fn default() -> Self {
        Self::new()
    }
}
