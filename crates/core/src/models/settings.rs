use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::errors::CoreError;
use crate::services::market_service::DEFAULT_TOP_N;
use crate::services::search_service::DEFAULT_SEARCH_LIMIT;

use super::history::Period;

/// Environment variable holding the Alpha Vantage key.
pub const ALPHAVANTAGE_KEY_ENV: &str = "ALPHAVANTAGE_API_KEY";

/// Key under which the Alpha Vantage API key is stored in `api_keys`.
pub const ALPHAVANTAGE_KEY: &str = "alphavantage";

/// Dashboard configuration. Every field has a default, so a partial JSON
/// file (or none at all) is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Optional API keys for providers that require them.
    /// Keys: provider name (e.g., "alphavantage"). Values: the key.
    pub api_keys: HashMap<String, String>,

    /// Symbols shown on the dashboard, fetched on demand when missing
    pub popular_symbols: Vec<String>,

    /// Window fetched by `add_stock` and `refresh_stock`
    pub refresh_period: Period,

    /// Window fetched for a missing popular symbol
    pub dashboard_period: Period,

    /// Window fetched when a detail page hits an untracked symbol
    pub detail_period: Period,

    /// Window fetched when a search falls back to an unknown-ticker lookup
    pub lookup_period: Period,

    /// Default result cap for `search_stocks`
    pub search_limit: usize,

    /// Default ranking length for `top_movers` and the dashboard
    pub top_movers_limit: usize,

    /// How many gainers/losers the dashboard displays
    pub dashboard_movers: usize,

    pub overview_movers: usize,

    /// Default age cut-off for `cleanup_old_data`
    pub history_retention_days: i64,

    /// Look-back used for technical indicators on the detail page
    pub indicator_window_days: i64,

    /// Look-back used for the detail page chart
    pub chart_window_days: i64,

    /// Bars listed in the detail page table
    pub recent_rows: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_keys: HashMap::new(),
            popular_symbols: ["AAPL", "GOOGL", "MSFT", "TSLA", "AMZN", "META", "NVDA", "NFLX"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            refresh_period: Period::SixMonths,
            dashboard_period: Period::ThreeMonths,
            detail_period: Period::OneYear,
            lookup_period: Period::OneYear,
            search_limit: DEFAULT_SEARCH_LIMIT,
            top_movers_limit: DEFAULT_TOP_N,
            dashboard_movers: 3,
            overview_movers: 10,
            history_retention_days: 30,
            indicator_window_days: 30,
            chart_window_days: 90,
            recent_rows: 10,
        }
    }
}

impl Settings {
    /// Parse settings from a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read settings from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Defaults plus provider keys from the environment (and `.env`, if present).
    pub fn from_env() -> Self {
        // A missing .env file is the normal case outside development
        let _ = dotenvy::dotenv();
        let mut settings = Self::default();
        if let Ok(key) = std::env::var(ALPHAVANTAGE_KEY_ENV) {
            if !key.trim().is_empty() {
                settings.api_keys.insert(ALPHAVANTAGE_KEY.to_string(), key);
            }
        }
        settings
    }

    pub fn api_key(&self, provider: &str) -> Option<&str> {
        self.api_keys.get(provider).map(String::as_str)
    }
}
