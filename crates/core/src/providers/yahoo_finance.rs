use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use yahoo_finance_api::YMetaData;

use crate::errors::CoreError;
use crate::models::history::{MarketSnapshot, Period, PriceHistoryPoint};
use crate::models::stock::Fundamentals;
use super::traits::MarketDataProvider;

const PROVIDER: &str = "Yahoo Finance";

/// Yahoo Finance provider for daily stock bars.
///
/// - **Free**: No API key required.
/// - **No strict rate limits** (unofficial public API).
/// - **Coverage**: Global equities, ETFs, indices, mutual funds.
///
/// Uses the `yahoo_finance_api` crate's chart endpoint with a daily
/// interval over the requested range. The chart metadata supplies the
/// display name and 52-week range; sector and industry stay unknown.
pub struct YahooFinanceProvider {
    connector: yahoo_finance_api::YahooConnector,
}

impl YahooFinanceProvider {
    pub fn new() -> Result<Self, CoreError> {
        let connector = yahoo_finance_api::YahooConnector::new().map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Failed to create connector: {e}"),
        })?;
        Ok(Self { connector })
    }

    /// Display name (long name, else short name) and the 52-week range
    /// from chart metadata.
    pub fn chart_profile(meta: &YMetaData) -> (Option<String>, Fundamentals) {
        let name = meta
            .long_name
            .clone()
            .or_else(|| meta.short_name.clone())
            .filter(|n| !n.trim().is_empty());
        let fundamentals = Fundamentals {
            fifty_two_week_high: meta.fifty_two_week_high.and_then(Decimal::from_f64),
            fifty_two_week_low: meta.fifty_two_week_low.and_then(Decimal::from_f64),
            ..Fundamentals::default()
        };
        (name, fundamentals)
    }

    /// Convert a unix timestamp (seconds) to `chrono::NaiveDate`.
    fn timestamp_to_naive_date(ts: i64) -> Option<NaiveDate> {
        chrono::DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn fetch_latest(
        &self,
        symbol: &str,
        period: Period,
    ) -> Result<Option<MarketSnapshot>, CoreError> {
        let resp = self
            .connector
            .get_quote_range(symbol, "1d", period.as_str())
            .await
            .map_err(|e| CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("Failed to fetch {period} history for {symbol}: {e}"),
            })?;

        let quotes = resp.quotes().map_err(|e| CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("Failed to parse quotes for {symbol}: {e}"),
        })?;

        // Bars with missing (NaN) prices are dropped rather than stored
        let history: Vec<PriceHistoryPoint> = quotes
            .iter()
            .filter_map(|q| {
                let date = Self::timestamp_to_naive_date(q.timestamp as i64)?;
                PriceHistoryPoint::from_f64(
                    symbol, date, q.open, q.high, q.low, q.close, q.volume,
                )
            })
            .collect();

        let (name, fundamentals) = match resp.metadata() {
            Ok(meta) => Self::chart_profile(&meta),
            Err(e) => {
                tracing::debug!(symbol, error = %e, "Yahoo chart metadata unavailable");
                (None, Fundamentals::default())
            }
        };

        Ok(MarketSnapshot::from_history(symbol, name, history, Utc::now())
            .map(|mut s| {
                s.record = s.record.with_fundamentals(fundamentals);
                s
            }))
    }
}
