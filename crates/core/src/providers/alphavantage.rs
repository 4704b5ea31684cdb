use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::history::{MarketSnapshot, Period, PriceHistoryPoint};
use crate::models::stock::{Fundamentals, StockRecord};
use super::traits::MarketDataProvider;

const BASE_URL: &str = "https://www.alphavantage.co/query";
const PROVIDER: &str = "Alpha Vantage";

/// Alpha Vantage provider for daily stock bars.
///
/// - **Free tier**: 25 requests/day (across ALL endpoints).
/// - **Requires**: API key (set via settings as "alphavantage").
/// - **Coverage**: 100k+ global equity symbols.
///
/// Registered after Yahoo Finance as a fallback. Each fetch costs two
/// requests: the daily series plus the company overview for name, sector,
/// industry and fundamentals. The overview is best-effort.
pub struct AlphaVantageProvider {
    client: Client,
    api_key: String,
}

impl AlphaVantageProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key,
        }
    }
}

// ── Alpha Vantage API response types ────────────────────────────────

#[derive(Deserialize)]
struct TimeSeriesResponse {
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<HashMap<String, DailyBar>>,

    #[serde(rename = "Error Message")]
    error_message: Option<String>,

    /// Rate-limit and premium-endpoint notices
    #[serde(rename = "Note", alias = "Information")]
    note: Option<String>,
}

#[derive(Deserialize)]
struct DailyBar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume")]
    volume: String,
}

#[derive(Deserialize)]
struct OverviewResponse {
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "Sector")]
    sector: Option<String>,
    #[serde(rename = "Industry")]
    industry: Option<String>,
    #[serde(rename = "MarketCapitalization")]
    market_cap: Option<String>,
    #[serde(rename = "PERatio")]
    pe_ratio: Option<String>,
    #[serde(rename = "DividendYield")]
    dividend_yield: Option<String>,
    #[serde(rename = "52WeekHigh")]
    week_52_high: Option<String>,
    #[serde(rename = "52WeekLow")]
    week_52_low: Option<String>,
    #[serde(rename = "Beta")]
    beta: Option<String>,
    #[serde(rename = "EPS")]
    eps: Option<String>,
    #[serde(rename = "BookValue")]
    book_value: Option<String>,
}

impl DailyBar {
    fn to_point(&self, symbol: &str, date: NaiveDate) -> Option<PriceHistoryPoint> {
        Some(PriceHistoryPoint {
            symbol: symbol.to_uppercase(),
            date,
            open: self.open.parse().ok()?,
            high: self.high.parse().ok()?,
            low: self.low.parse().ok()?,
            close: self.close.parse().ok()?,
            volume: self.volume.parse().unwrap_or(0),
        })
    }
}

/// Company profile from the `OVERVIEW` endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyOverview {
    pub name: String,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub fundamentals: Fundamentals,
}

impl CompanyOverview {
    /// Copy the profile onto `record`. Sector and industry are applied
    /// independently; missing ones keep the record's value.
    pub fn apply_to(self, mut record: StockRecord) -> StockRecord {
        if let Some(sector) = self.sector {
            record.sector = sector;
        }
        if let Some(industry) = self.industry {
            record.industry = industry;
        }
        record.with_fundamentals(self.fundamentals)
    }
}

/// `outputsize` for a daily series request. Compact output covers the last
/// 100 trading days, enough for anything up to three months.
pub fn output_size(period: Period) -> &'static str {
    match period.approx_days() {
        Some(days) if days <= 100 => "compact",
        _ => "full",
    }
}

/// Parse a `TIME_SERIES_DAILY` body into date-sorted bars trimmed to
/// `period` (counted back from the latest bar).
///
/// Returns `Ok(None)` when the API reports an unknown symbol through
/// "Error Message". A body with neither series nor error is an API error.
pub fn parse_daily_series(
    symbol: &str,
    body: &str,
    period: Period,
) -> Result<Option<Vec<PriceHistoryPoint>>, CoreError> {
    let resp: TimeSeriesResponse = serde_json::from_str(body).map_err(|e| CoreError::Api {
        provider: PROVIDER.into(),
        message: format!("Failed to parse time series for {symbol}: {e}"),
    })?;

    if resp.error_message.is_some() {
        return Ok(None);
    }

    let Some(series) = resp.time_series else {
        let detail = resp
            .note
            .unwrap_or_else(|| "API limit may be exceeded.".to_string());
        return Err(CoreError::Api {
            provider: PROVIDER.into(),
            message: format!("No time series data for {symbol}. {detail}"),
        });
    };

    let mut history: Vec<PriceHistoryPoint> = series
        .iter()
        .filter_map(|(date_str, bar)| {
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").ok()?;
            bar.to_point(symbol, date)
        })
        .collect();
    history.sort_by_key(|p| p.date);

    // The API returns a fixed-size series; trim to the requested window
    if let (Some(days), Some(latest)) = (period.approx_days(), history.last().map(|p| p.date)) {
        let cutoff = latest - chrono::Duration::days(days);
        history.retain(|p| p.date > cutoff);
    }

    Ok(Some(history))
}

/// Parse an `OVERVIEW` body. Unknown symbols come back as `{}`, so a body
/// without a company name yields `Ok(None)`.
///
/// Alpha Vantage writes "None" or "-" for missing values; those become
/// `None`. `DividendYield` is a fraction and is stored as a percentage.
pub fn parse_overview(body: &str) -> Result<Option<CompanyOverview>, CoreError> {
    let resp: OverviewResponse = serde_json::from_str(body).map_err(|e| CoreError::Api {
        provider: PROVIDER.into(),
        message: format!("Failed to parse overview: {e}"),
    })?;

    let Some(name) = present(&resp.name).map(str::to_string) else {
        return Ok(None);
    };

    let fundamentals = Fundamentals {
        market_cap: parse_field(&resp.market_cap),
        pe_ratio: parse_field(&resp.pe_ratio),
        dividend_yield: parse_field::<Decimal>(&resp.dividend_yield)
            .and_then(|y| y.checked_mul(Decimal::ONE_HUNDRED)),
        fifty_two_week_high: parse_field(&resp.week_52_high),
        fifty_two_week_low: parse_field(&resp.week_52_low),
        avg_volume: None,
        beta: parse_field(&resp.beta),
        eps: parse_field(&resp.eps),
        book_value: parse_field(&resp.book_value),
    };

    Ok(Some(CompanyOverview {
        name,
        sector: present(&resp.sector).map(str::to_string),
        industry: present(&resp.industry).map(str::to_string),
        fundamentals,
    }))
}

fn present(raw: &Option<String>) -> Option<&str> {
    raw.as_deref()
        .map(str::trim)
        .filter(|v| !matches!(*v, "" | "None" | "-"))
}

fn parse_field<T: FromStr>(raw: &Option<String>) -> Option<T> {
    present(raw).and_then(|v| v.parse().ok())
}

#[async_trait]
impl MarketDataProvider for AlphaVantageProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn fetch_latest(
        &self,
        symbol: &str,
        period: Period,
    ) -> Result<Option<MarketSnapshot>, CoreError> {
        let Some(history) = self.fetch_daily_series(symbol, period).await? else {
            return Ok(None);
        };

        let overview = match self.fetch_overview(symbol).await {
            Ok(o) => o,
            Err(e) => {
                tracing::debug!(symbol, error = %e, "Alpha Vantage overview unavailable");
                None
            }
        };
        let name = overview.as_ref().map(|o| o.name.clone());

        let snapshot = MarketSnapshot::from_history(symbol, name, history, Utc::now()).map(|mut s| {
            if let Some(o) = overview {
                s.record = o.apply_to(s.record);
            }
            s
        });
        Ok(snapshot)
    }
}

impl AlphaVantageProvider {
    async fn fetch_daily_series(
        &self,
        symbol: &str,
        period: Period,
    ) -> Result<Option<Vec<PriceHistoryPoint>>, CoreError> {
        let body = self
            .client
            .get(BASE_URL)
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", &symbol.to_uppercase()),
                ("outputsize", output_size(period)),
                ("apikey", &self.api_key),
            ])
            .send()
            .await?
            .text()
            .await?;

        parse_daily_series(symbol, &body, period)
    }

    async fn fetch_overview(&self, symbol: &str) -> Result<Option<CompanyOverview>, CoreError> {
        let body = self
            .client
            .get(BASE_URL)
            .query(&[
                ("function", "OVERVIEW"),
                ("symbol", &symbol.to_uppercase()),
                ("apikey", &self.api_key),
            ])
            .send()
            .await?
            .text()
            .await?;

        parse_overview(&body)
    }
}
