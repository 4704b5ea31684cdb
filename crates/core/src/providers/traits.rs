use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::history::{MarketSnapshot, Period};

/// Trait abstraction for market-data sources.
///
/// Each finance API (Yahoo Finance, Alpha Vantage) implements this trait.
/// If an API stops working or changes, only that implementation is replaced.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Fetch the latest quote and the bar series covering `period`.
    ///
    /// `Ok(None)` means the provider answered but has no data for the
    /// symbol (unknown ticker, delisted). Transport and API failures are
    /// returned as `Err`.
    async fn fetch_latest(
        &self,
        symbol: &str,
        period: Period,
    ) -> Result<Option<MarketSnapshot>, CoreError>;
}
