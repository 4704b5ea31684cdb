use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::stock::{Fundamentals, StockRecord};

/// One daily OHLCV bar for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistoryPoint {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

impl PriceHistoryPoint {
    /// Build a bar from raw provider floats.
    /// Returns None if any price is NaN or infinite.
    pub fn from_f64(
        symbol: &str,
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Option<Self> {
        Some(Self {
            symbol: symbol.to_uppercase(),
            date,
            open: Decimal::from_f64(open)?,
            high: Decimal::from_f64(high)?,
            low: Decimal::from_f64(low)?,
            close: Decimal::from_f64(close)?,
            volume,
        })
    }
}

/// Look-back window requested from a market-data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "max")]
    Max,
}

impl Period {
    /// The range string used by Yahoo-style chart endpoints.
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::FiveDays => "5d",
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
            Period::Max => "max",
        }
    }

    /// Approximate calendar length, used to trim providers that only
    /// return a fixed-size series. `None` means unbounded.
    pub fn approx_days(&self) -> Option<i64> {
        match self {
            Period::OneDay => Some(1),
            Period::FiveDays => Some(5),
            Period::OneMonth => Some(31),
            Period::ThreeMonths => Some(92),
            Period::SixMonths => Some(183),
            Period::OneYear => Some(366),
            Period::TwoYears => Some(731),
            Period::FiveYears => Some(1827),
            Period::Max => None,
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a single market-data fetch yields: the refreshed record and the
/// full bar series that replaces the stored history for the symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub record: StockRecord,
    pub history: Vec<PriceHistoryPoint>,
}

impl MarketSnapshot {
    /// Derive the stock record from a bar series.
    ///
    /// Bars are sorted by date. The last close is the current price, the
    /// close before it is the previous close (or the current price when
    /// only one bar exists). `avg_volume` is the mean volume over the
    /// series. Returns None for an empty series.
    pub fn from_history(
        symbol: &str,
        name: Option<String>,
        mut history: Vec<PriceHistoryPoint>,
        fetched_at: DateTime<Utc>,
    ) -> Option<Self> {
        history.sort_by_key(|p| p.date);
        let last = history.last()?;
        let current_price = last.close;
        let previous_close = history
            .len()
            .checked_sub(2)
            .map(|i| history[i].close)
            .unwrap_or(current_price);

        let symbol = symbol.to_uppercase();
        let record = StockRecord::new(
            symbol.clone(),
            name.unwrap_or_else(|| symbol.clone()),
            current_price,
            previous_close,
            last.volume,
            fetched_at,
        )
        .with_fundamentals(Fundamentals {
            avg_volume: average_volume(&history),
            ..Fundamentals::default()
        });
        Some(Self { record, history })
    }
}

fn average_volume(history: &[PriceHistoryPoint]) -> Option<u64> {
    let total: u128 = history.iter().map(|p| u128::from(p.volume)).sum();
    let count = u128::try_from(history.len()).ok().filter(|n| *n > 0)?;
    u64::try_from(total / count).ok()
}
