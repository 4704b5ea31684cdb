use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::models::history::Period;
use crate::models::stock::StockRecord;
use crate::providers::registry::MarketDataRegistry;
use crate::storage::StockStore;

/// Pulls market data from providers into the store.
///
/// A successful fetch upserts the stock record and replaces the symbol's
/// whole price history with the fetched window. Nothing is merged, so the
/// stored history is only ever as long as the latest fetch.
pub struct SyncService {
    registry: MarketDataRegistry,
}

impl SyncService {
    pub fn new(registry: MarketDataRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &MarketDataRegistry {
        &self.registry
    }

    /// Fetch `symbol` over `period` and store the result.
    ///
    /// Upstream problems (unknown symbol, API errors, timeouts) are logged
    /// and reported as `Ok(None)`; there is no retry. Only store failures
    /// come back as `Err`.
    pub async fn fetch_and_store(
        &self,
        store: &mut dyn StockStore,
        symbol: &str,
        period: Period,
    ) -> Result<Option<StockRecord>, CoreError> {
        let symbol = symbol.to_uppercase();
        let snapshot = match self.registry.fetch_latest(&symbol, period).await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                tracing::warn!(%symbol, %period, "no market data found");
                return Ok(None);
            }
            Err(e) => {
                tracing::error!(%symbol, %period, error = %e, "failed to fetch market data");
                return Ok(None);
            }
        };

        let record = snapshot.record;
        let bars = snapshot.history.len();
        store.upsert_stock(record.clone())?;
        store.replace_price_history(&symbol, snapshot.history)?;

        tracing::info!(%symbol, %period, bars, price = %record.current_price, "stored market data");
        Ok(Some(record))
    }

    /// Return the stored record, fetching it first if the store has none.
    pub async fn get_or_fetch(
        &self,
        store: &mut dyn StockStore,
        symbol: &str,
        period: Period,
    ) -> Result<Option<StockRecord>, CoreError> {
        if let Some(record) = store.find_stock(symbol)? {
            return Ok(Some(record));
        }
        self.fetch_and_store(store, symbol, period).await
    }

    /// Delete price history older than `days` days before `today`.
    pub fn cleanup_old_history(
        &self,
        store: &mut dyn StockStore,
        days: i64,
        today: NaiveDate,
    ) -> Result<usize, CoreError> {
        if days < 0 {
            return Err(CoreError::Validation(format!(
                "Retention must be zero or more days, got {days}"
            )));
        }
        let cutoff = today - chrono::Duration::days(days);
        let removed = store.delete_price_history_before(cutoff)?;
        tracing::info!(removed, %cutoff, "cleaned up old price history");
        Ok(removed)
    }
}
