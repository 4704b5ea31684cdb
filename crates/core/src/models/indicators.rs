use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::history::PriceHistoryPoint;
use super::stock::StockRecord;

/// Latest values of the basic technical indicators, rounded to cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalIndicators {
    pub sma_10: Decimal,
    pub sma_14: Decimal,
    pub sma_20: Decimal,

    /// 14-period relative strength index, in [0, 100]
    pub rsi_14: Decimal,

    /// Close of the most recent bar
    pub current_price: Decimal,
}

/// Data backing a single-stock page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockDetail {
    pub stock: StockRecord,

    /// Bars for the chart window, oldest first
    pub history: Vec<PriceHistoryPoint>,

    /// None when the indicator window has fewer than 20 bars
    pub indicators: Option<TechnicalIndicators>,

    /// Most recent bars of the indicator window, oldest first
    pub recent: Vec<PriceHistoryPoint>,
}
