use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Longest ticker accepted by [`normalize_symbol`].
pub const MAX_SYMBOL_LEN: usize = 10;

/// Sector/industry placeholder when the data source has no company profile.
pub const UNKNOWN: &str = "Unknown";

/// Trim and uppercase a ticker, rejecting anything that isn't a plausible symbol.
///
/// Accepted: 1..=10 ASCII alphanumerics, optionally with `.` separators
/// (e.g. "BRK.B", "VOD.L").
pub fn normalize_symbol(raw: &str) -> Result<String, CoreError> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(CoreError::Validation("Symbol is required".into()));
    }
    let stripped: String = symbol.chars().filter(|c| *c != '.').collect();
    if symbol.len() > MAX_SYMBOL_LEN
        || stripped.is_empty()
        || !stripped.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(CoreError::InvalidSymbol(symbol));
    }
    Ok(symbol)
}

/// Latest known quote for a tracked symbol.
///
/// Replaced wholesale on every refresh (upsert by `symbol`). The derived
/// change fields are computed once in [`StockRecord::new`] and never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    /// Uppercase ticker, the record's unique key
    pub symbol: String,

    /// Company / fund display name
    pub name: String,

    pub sector: String,

    pub industry: String,

    pub current_price: Decimal,

    pub previous_close: Decimal,

    /// current_price − previous_close
    pub price_change: Decimal,

    /// price_change / previous_close × 100, or 0 when previous_close is 0
    pub price_change_percent: Decimal,

    /// Shares traded in the latest session
    pub volume: u64,

    #[serde(default)]
    pub fundamentals: Fundamentals,

    pub last_updated: DateTime<Utc>,
}

/// Valuation ratios and trading ranges from a company profile.
///
/// Every field is optional: providers fill what their endpoints carry and
/// leave the rest empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub market_cap: Option<u64>,

    /// Trailing price / earnings
    pub pe_ratio: Option<Decimal>,

    /// Annual dividend yield in percent (0.44 means 0.44%)
    pub dividend_yield: Option<Decimal>,

    pub fifty_two_week_high: Option<Decimal>,

    pub fifty_two_week_low: Option<Decimal>,

    /// Mean daily volume
    pub avg_volume: Option<u64>,

    pub beta: Option<Decimal>,

    /// Trailing earnings per share
    pub eps: Option<Decimal>,

    /// Book value per share
    pub book_value: Option<Decimal>,
}

impl Fundamentals {
    /// Field-wise: the value from `self` where present, else `fallback`'s.
    pub fn or(self, fallback: Fundamentals) -> Fundamentals {
        Fundamentals {
            market_cap: self.market_cap.or(fallback.market_cap),
            pe_ratio: self.pe_ratio.or(fallback.pe_ratio),
            dividend_yield: self.dividend_yield.or(fallback.dividend_yield),
            fifty_two_week_high: self.fifty_two_week_high.or(fallback.fifty_two_week_high),
            fifty_two_week_low: self.fifty_two_week_low.or(fallback.fifty_two_week_low),
            avg_volume: self.avg_volume.or(fallback.avg_volume),
            beta: self.beta.or(fallback.beta),
            eps: self.eps.or(fallback.eps),
            book_value: self.book_value.or(fallback.book_value),
        }
    }
}

impl StockRecord {
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        current_price: Decimal,
        previous_close: Decimal,
        volume: u64,
        last_updated: DateTime<Utc>,
    ) -> Self {
        let price_change = current_price - previous_close;
        Self {
            symbol: symbol.into().to_uppercase(),
            name: name.into(),
            sector: UNKNOWN.to_string(),
            industry: UNKNOWN.to_string(),
            current_price,
            previous_close,
            price_change,
            price_change_percent: change_percent(price_change, previous_close),
            volume,
            fundamentals: Fundamentals::default(),
            last_updated,
        }
    }

    /// Overlay provider fundamentals; fields `fundamentals` leaves empty
    /// keep their current value.
    pub fn with_fundamentals(mut self, fundamentals: Fundamentals) -> Self {
        self.fundamentals = fundamentals.or(self.fundamentals);
        self
    }

    pub fn is_gainer(&self) -> bool {
        self.price_change_percent > Decimal::ZERO
    }

    pub fn is_loser(&self) -> bool {
        self.price_change_percent < Decimal::ZERO
    }
}

/// `change / base × 100`, defined as 0 for a zero base or a ratio outside
/// `Decimal`'s range.
pub fn change_percent(change: Decimal, base: Decimal) -> Decimal {
    checked_change_percent(change, base).unwrap_or(Decimal::ZERO)
}

/// `change / base × 100`; `Some(0)` for a zero base, `None` on overflow.
pub fn checked_change_percent(change: Decimal, base: Decimal) -> Option<Decimal> {
    if base.is_zero() {
        return Some(Decimal::ZERO);
    }
    change.checked_div(base)?.checked_mul(Decimal::ONE_HUNDRED)
}
