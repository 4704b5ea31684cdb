use std::collections::HashMap;

use crate::errors::CoreError;
use crate::models::history::{MarketSnapshot, Period};
use crate::models::settings::ALPHAVANTAGE_KEY;

use super::alphavantage::AlphaVantageProvider;
use super::traits::MarketDataProvider;
use super::yahoo_finance::YahooFinanceProvider;

/// Ordered set of market-data providers.
///
/// Requests go to the first registered provider; if it fails or has no data
/// the next one is tried. New providers can be added without touching callers.
pub struct MarketDataRegistry {
    providers: Vec<Box<dyn MarketDataProvider>>,
}

impl MarketDataRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Create a registry with the default providers.
    pub fn new_with_defaults(api_keys: &HashMap<String, String>) -> Self {
        let mut registry = Self::new();

        // Yahoo Finance — no API key needed (primary)
        match YahooFinanceProvider::new() {
            Ok(yahoo) => registry.register(Box::new(yahoo)),
            Err(e) => tracing::warn!(error = %e, "Yahoo Finance provider unavailable"),
        }

        // Alpha Vantage — requires API key (fallback)
        if let Some(key) = api_keys.get(ALPHAVANTAGE_KEY) {
            registry.register(Box::new(AlphaVantageProvider::new(key.clone())));
        }

        registry
    }

    /// Register a new provider at the lowest priority.
    pub fn register(&mut self, provider: Box<dyn MarketDataProvider>) {
        self.providers.push(provider);
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Names of the registered providers, in priority order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Fetch from providers in registration order.
    ///
    /// The first snapshot wins. If every provider answered "no data" the
    /// result is `Ok(None)`; if at least one failed and none had data, the
    /// last error is returned.
    pub async fn fetch_latest(
        &self,
        symbol: &str,
        period: Period,
    ) -> Result<Option<MarketSnapshot>, CoreError> {
        if self.providers.is_empty() {
            return Err(CoreError::NoProvider);
        }

        let mut last_error = None;
        for provider in &self.providers {
            match provider.fetch_latest(symbol, period).await {
                Ok(Some(snapshot)) => {
                    tracing::debug!(provider = provider.name(), symbol, "fetched market data");
                    return Ok(Some(snapshot));
                }
                Ok(None) => {
                    tracing::debug!(provider = provider.name(), symbol, "provider has no data");
                }
                Err(e) => {
                    tracing::warn!(provider = provider.name(), symbol, error = %e, "provider failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }
}

impl Default for MarketDataRegistry {
    fn default() -> Self {
        Self::new()
    }
}
