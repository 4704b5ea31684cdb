pub mod errors;
pub mod logging;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::Path;

use errors::CoreError;
use models::{
    history::PriceHistoryPoint,
    holding::{HoldingPosition, UserId},
    indicators::StockDetail,
    market::{DashboardView, MarketOverview, MarketSummary, TopMovers},
    settings::Settings,
    stock::{normalize_symbol, StockRecord},
    valuation::PortfolioValuation,
    watchlist::WatchlistEntry,
};
use providers::registry::MarketDataRegistry;
use services::{
    indicator_service::IndicatorService, market_service::MarketService,
    position_service::PositionService, search_service::SearchService,
    sync_service::SyncService, valuation_service::ValuationService,
};
use storage::{memory::MemoryStore, snapshot::SnapshotManager, StockStore};

/// Main entry point for the stock dashboard core.
///
/// Owns the document store, the market-data providers and the settings, and
/// exposes the request/response operations a web layer calls. The store is
/// injected, so tests can substitute their own `StockStore`.
#[must_use]
pub struct StockDashboard<S: StockStore = MemoryStore> {
    store: S,
    settings: Settings,
    sync_service: SyncService,
    position_service: PositionService,
    valuation_service: ValuationService,
    market_service: MarketService,
    search_service: SearchService,
    indicator_service: IndicatorService,
    /// Tracks whether any mutation has occurred since the last save/load.
    dirty: bool,
}

impl<S: StockStore> std::fmt::Debug for StockDashboard<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StockDashboard")
            .field("providers", &self.sync_service.registry().provider_names())
            .field("settings", &self.settings)
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl StockDashboard<MemoryStore> {
    /// Empty in-memory dashboard with the default providers for `settings`.
    pub fn create_new(settings: Settings) -> Self {
        let registry = MarketDataRegistry::new_with_defaults(&settings.api_keys);
        Self::new(MemoryStore::new(), registry, settings)
    }

    /// Restore a dashboard from an encrypted snapshot.
    pub fn load_from_bytes(
        encrypted: &[u8],
        passphrase: &str,
        registry: MarketDataRegistry,
        settings: Settings,
    ) -> Result<Self, CoreError> {
        let store: MemoryStore = SnapshotManager::load_from_bytes(encrypted, passphrase)?;
        Ok(Self::new(store, registry, settings))
    }

    /// Encrypt the store into snapshot bytes.
    /// Clears the unsaved-changes flag on success.
    pub fn save_to_bytes(&mut self, passphrase: &str) -> Result<Vec<u8>, CoreError> {
        let bytes = SnapshotManager::save_to_bytes(&self.store, passphrase)?;
        self.dirty = false;
        Ok(bytes)
    }

    pub fn load_from_file(
        path: impl AsRef<Path>,
        passphrase: &str,
        registry: MarketDataRegistry,
        settings: Settings,
    ) -> Result<Self, CoreError> {
        let store: MemoryStore = SnapshotManager::load_from_file(path, passphrase)?;
        Ok(Self::new(store, registry, settings))
    }

    /// Clears the unsaved-changes flag on success.
    pub fn save_to_file(&mut self, path: impl AsRef<Path>, passphrase: &str) -> Result<(), CoreError> {
        SnapshotManager::save_to_file(&self.store, path, passphrase)?;
        self.dirty = false;
        Ok(())
    }
}

impl<S: StockStore> StockDashboard<S> {
    pub fn new(store: S, registry: MarketDataRegistry, settings: Settings) -> Self {
        Self {
            store,
            settings,
            sync_service: SyncService::new(registry),
            position_service: PositionService::new(),
            valuation_service: ValuationService::new(),
            market_service: MarketService::new(),
            search_service: SearchService::new(),
            indicator_service: IndicatorService::new(),
            dirty: false,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Whether the store changed since it was created, loaded or last saved.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    // ── Stocks ──────────────────────────────────────────────────────

    /// Start tracking a symbol. Returns the stored record if it is already
    /// tracked, otherwise fetches it.
    pub async fn add_stock(&mut self, symbol: &str) -> Result<StockRecord, CoreError> {
        let symbol = normalize_symbol(symbol)?;
        if let Some(existing) = self.store.find_stock(&symbol)? {
            tracing::debug!(%symbol, "stock already tracked");
            return Ok(existing);
        }
        let period = self.settings.refresh_period;
        self.fetch(&symbol, period)
            .await?
            .ok_or(CoreError::StockNotFound(symbol))
    }

    /// Re-fetch a symbol, replacing its record and price history.
    pub async fn refresh_stock(&mut self, symbol: &str) -> Result<StockRecord, CoreError> {
        let symbol = normalize_symbol(symbol)?;
        let period = self.settings.refresh_period;
        self.fetch(&symbol, period)
            .await?
            .ok_or(CoreError::StockNotFound(symbol))
    }

    pub fn get_stock(&self, symbol: &str) -> Result<Option<StockRecord>, CoreError> {
        self.store.find_stock(symbol)
    }

    /// Bars from the last `days` days up to `today`, oldest first.
    pub fn price_history(
        &self,
        symbol: &str,
        days: i64,
        today: NaiveDate,
    ) -> Result<Vec<PriceHistoryPoint>, CoreError> {
        self.store
            .price_history(symbol, today - chrono::Duration::days(days))
    }

    /// Record, chart history, indicators and recent bars for one symbol.
    /// An untracked symbol is fetched first.
    pub async fn stock_detail(&mut self, symbol: &str, today: NaiveDate) -> Result<StockDetail, CoreError> {
        let symbol = normalize_symbol(symbol)?;
        let stock = match self.store.find_stock(&symbol)? {
            Some(stock) => stock,
            None => {
                let period = self.settings.detail_period;
                self.fetch(&symbol, period)
                    .await?
                    .ok_or_else(|| CoreError::StockNotFound(symbol.clone()))?
            }
        };

        let history = self.price_history(&symbol, self.settings.chart_window_days, today)?;
        let window = self.price_history(&symbol, self.settings.indicator_window_days, today)?;
        let indicators = self.indicator_service.calculate(&window);
        let recent = window[window.len().saturating_sub(self.settings.recent_rows)..].to_vec();

        Ok(StockDetail {
            stock,
            history,
            indicators,
            recent,
        })
    }

    /// Symbol/name search, capped at `limit` or `settings.search_limit`.
    /// If nothing matches and the query looks like a ticker, the symbol is
    /// fetched and returned on success.
    pub async fn search_stocks(
        &mut self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<StockRecord>, CoreError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let limit = limit.unwrap_or(self.settings.search_limit);

        let all = self.store.find_all_stocks(usize::MAX)?;
        let found: Vec<StockRecord> = self
            .search_service
            .search(&all, query, limit)
            .into_iter()
            .cloned()
            .collect();
        if !found.is_empty() || !SearchService::looks_like_ticker(query) {
            return Ok(found);
        }

        tracing::debug!(query, "no local match, trying unknown-ticker lookup");
        let period = self.settings.lookup_period;
        let fetched = self.fetch(&query.to_uppercase(), period).await?;
        Ok(fetched.into_iter().collect())
    }

    /// Delete price history older than `days` days (default
    /// `settings.history_retention_days`). Returns the number of bars removed.
    pub fn cleanup_old_data(&mut self, days: Option<i64>, today: NaiveDate) -> Result<usize, CoreError> {
        let days = days.unwrap_or(self.settings.history_retention_days);
        let removed = self
            .sync_service
            .cleanup_old_history(&mut self.store, days, today)?;
        if removed > 0 {
            self.dirty = true;
        }
        Ok(removed)
    }

    // ── Portfolio ───────────────────────────────────────────────────

    /// Record a simulated buy. The symbol must already be tracked.
    pub fn add_to_portfolio(
        &mut self,
        user_id: UserId,
        symbol: &str,
        quantity: Decimal,
        purchase_price: Decimal,
    ) -> Result<HoldingPosition, CoreError> {
        let symbol = normalize_symbol(symbol)?;
        PositionService::validate_buy(quantity, purchase_price)?;
        if self.store.find_stock(&symbol)?.is_none() {
            return Err(CoreError::StockNotFound(symbol));
        }

        let position = self.position_service.add_to_portfolio(
            &mut self.store,
            user_id,
            &symbol,
            quantity,
            purchase_price,
            Utc::now(),
        )?;
        self.dirty = true;
        Ok(position)
    }

    pub fn holdings(&self, user_id: UserId) -> Result<Vec<HoldingPosition>, CoreError> {
        self.store.find_holdings(user_id)
    }

    /// Value a user's holdings at the stored prices.
    pub fn portfolio_value(&self, user_id: UserId) -> Result<PortfolioValuation, CoreError> {
        let holdings = self.store.find_holdings(user_id)?;

        // Resolve up front so store errors surface instead of looking like missing stocks
        let mut prices: HashMap<String, StockRecord> = HashMap::new();
        for holding in &holdings {
            if !prices.contains_key(&holding.symbol) {
                if let Some(stock) = self.store.find_stock(&holding.symbol)? {
                    prices.insert(holding.symbol.clone(), stock);
                }
            }
        }

        self.valuation_service
            .value_portfolio(&holdings, |symbol| prices.get(symbol).cloned())
    }

    // ── Market ──────────────────────────────────────────────────────

    pub fn market_summary(&self) -> Result<MarketSummary, CoreError> {
        let all = self.store.find_all_stocks(usize::MAX)?;
        Ok(self.market_service.summarize(&all))
    }

    /// Top `n` gainers and losers, `settings.top_movers_limit` by default.
    pub fn top_movers(&self, n: Option<usize>) -> Result<TopMovers, CoreError> {
        let n = n.unwrap_or(self.settings.top_movers_limit);
        let all = self.store.find_all_stocks(usize::MAX)?;
        Ok(self.market_service.top_movers(&all, n))
    }

    /// Summary plus the overview-sized movers lists.
    pub fn market_overview(&self) -> Result<MarketOverview, CoreError> {
        let all = self.store.find_all_stocks(usize::MAX)?;
        Ok(MarketOverview {
            summary: self.market_service.summarize(&all),
            movers: self
                .market_service
                .top_movers(&all, self.settings.overview_movers),
        })
    }

    /// Landing page data. Popular symbols missing from the store are
    /// fetched; those that can't be fetched are skipped.
    pub async fn dashboard(&mut self) -> Result<DashboardView, CoreError> {
        let period = self.settings.dashboard_period;
        let mut stocks = Vec::new();
        for symbol in self.settings.popular_symbols.clone() {
            let stock = match self.store.find_stock(&symbol)? {
                Some(stock) => Some(stock),
                None => self.fetch(&symbol, period).await?,
            };
            stocks.extend(stock);
        }

        let all = self.store.find_all_stocks(usize::MAX)?;
        let movers = self
            .market_service
            .top_movers(&all, self.settings.top_movers_limit)
            .truncated(self.settings.dashboard_movers);

        Ok(DashboardView {
            stocks,
            summary: self.market_service.summarize(&all),
            movers,
        })
    }

    // ── Watchlist ───────────────────────────────────────────────────

    /// Returns false if the symbol was already on the user's watchlist.
    pub fn add_to_watchlist(&mut self, user_id: UserId, symbol: &str) -> Result<bool, CoreError> {
        let symbol = normalize_symbol(symbol)?;
        let added = self
            .store
            .add_watchlist_entry(WatchlistEntry::new(user_id, symbol, Utc::now()))?;
        self.dirty |= added;
        Ok(added)
    }

    /// Returns false if the symbol wasn't on the user's watchlist.
    pub fn remove_from_watchlist(&mut self, user_id: UserId, symbol: &str) -> Result<bool, CoreError> {
        let symbol = normalize_symbol(symbol)?;
        let removed = self.store.remove_watchlist_entry(user_id, &symbol)?;
        self.dirty |= removed;
        Ok(removed)
    }

    /// A user's watchlist, newest first.
    pub fn watchlist(&self, user_id: UserId) -> Result<Vec<WatchlistEntry>, CoreError> {
        self.store.find_watchlist(user_id)
    }

    // ── Internal ────────────────────────────────────────────────────

    async fn fetch(
        &mut self,
        symbol: &str,
        period: models::history::Period,
    ) -> Result<Option<StockRecord>, CoreError> {
        let fetched = self
            .sync_service
            .fetch_and_store(&mut self.store, symbol, period)
            .await?;
        if fetched.is_some() {
            self.dirty = true;
        }
        Ok(fetched)
    }
}
