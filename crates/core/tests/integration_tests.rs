use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use stock_dashboard_core::errors::CoreError;
use stock_dashboard_core::models::history::{MarketSnapshot, Period, PriceHistoryPoint};
use stock_dashboard_core::models::settings::Settings;
use stock_dashboard_core::providers::registry::MarketDataRegistry;
use stock_dashboard_core::providers::traits::MarketDataProvider;
use stock_dashboard_core::services::sync_service::SyncService;
use stock_dashboard_core::storage::memory::MemoryStore;
use stock_dashboard_core::StockDashboard;

// ═══════════════════════════════════════════════════════════════════
// Mock Market Data Provider (for testing without real API calls)
// ═══════════════════════════════════════════════════════════════════

/// Serves a fixed close series per symbol as daily bars ending today.
struct MockMarketProvider {
    series: HashMap<String, Vec<Decimal>>,
    calls: Arc<AtomicUsize>,
}

impl MockMarketProvider {
    fn new(series: &[(&str, Vec<Decimal>)]) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = Self {
            series: series
                .iter()
                .map(|(s, closes)| (s.to_string(), closes.clone()))
                .collect(),
            calls: Arc::clone(&calls),
        };
        (provider, calls)
    }
}

#[async_trait]
impl MarketDataProvider for MockMarketProvider {
    fn name(&self) -> &str {
        "Mock"
    }

    async fn fetch_latest(
        &self,
        symbol: &str,
        _period: Period,
    ) -> Result<Option<MarketSnapshot>, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let Some(closes) = self.series.get(&symbol.to_uppercase()) else {
            return Ok(None);
        };
        let today = Utc::now().date_naive();
        let n = closes.len() as i64;
        let history = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceHistoryPoint {
                symbol: symbol.to_uppercase(),
                date: today - Duration::days(n - 1 - i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1_000,
            })
            .collect();
        Ok(MarketSnapshot::from_history(symbol, None, history, Utc::now()))
    }
}

/// A provider that is always down.
struct OfflineProvider;

#[async_trait]
impl MarketDataProvider for OfflineProvider {
    fn name(&self) -> &str {
        "Offline"
    }

    async fn fetch_latest(
        &self,
        _symbol: &str,
        _period: Period,
    ) -> Result<Option<MarketSnapshot>, CoreError> {
        Err(CoreError::Network("connection refused".into()))
    }
}

fn closes(values: &[i64]) -> Vec<Decimal> {
    values.iter().map(|&v| Decimal::from(v)).collect()
}

fn market() -> Vec<(&'static str, Vec<Decimal>)> {
    vec![
        ("AAPL", closes(&[100, 132])),
        ("MSFT", closes(&[100, 102])),
        ("TSLA", closes(&[100, 99])),
        ("FLAT", closes(&[50, 50])),
        ("LONG", (1..=40).map(Decimal::from).collect()),
    ]
}

fn dashboard_with(settings: Settings) -> (StockDashboard, Arc<AtomicUsize>) {
    let (provider, calls) = MockMarketProvider::new(&market());
    let mut registry = MarketDataRegistry::new();
    registry.register(Box::new(provider));
    (StockDashboard::new(MemoryStore::new(), registry, settings), calls)
}

fn dashboard() -> (StockDashboard, Arc<AtomicUsize>) {
    dashboard_with(Settings::default())
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

// ═══════════════════════════════════════════════════════════════════
// Stocks
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_new_dashboard_is_clean() {
    let db = StockDashboard::create_new(Settings::default());
    assert!(!db.has_unsaved_changes());
    assert_eq!(db.store().stock_count(), 0);
    assert!(format!("{db:?}").contains("Yahoo Finance"));
}

#[tokio::test]
async fn test_add_stock_fetches_and_stores() {
    let (mut db, calls) = dashboard();
    let stock = db.add_stock(" aapl ").await.unwrap();

    assert_eq!(stock.symbol, "AAPL");
    assert_eq!(stock.current_price, dec!(132));
    assert_eq!(stock.previous_close, dec!(100));
    assert_eq!(stock.price_change, dec!(32));
    assert_eq!(stock.price_change_percent, dec!(32));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(db.has_unsaved_changes());
    assert_eq!(db.price_history("AAPL", 30, today()).unwrap().len(), 2);
}

#[tokio::test]
async fn test_add_stock_twice_does_not_refetch() {
    let (mut db, calls) = dashboard();
    db.add_stock("AAPL").await.unwrap();
    let again = db.add_stock("AAPL").await.unwrap();
    assert_eq!(again.symbol, "AAPL");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(db.store().stock_count(), 1);
}

#[tokio::test]
async fn test_add_unknown_stock_is_not_found() {
    let (mut db, _) = dashboard();
    let err = db.add_stock("ZZZZ").await.unwrap_err();
    assert!(matches!(err, CoreError::StockNotFound(ref s) if s == "ZZZZ"));
    assert!(!db.has_unsaved_changes());
}

#[tokio::test]
async fn test_add_stock_rejects_bad_symbol() {
    let (mut db, calls) = dashboard();
    assert!(matches!(db.add_stock("").await, Err(CoreError::Validation(_))));
    assert!(matches!(db.add_stock("AA PL").await, Err(CoreError::InvalidSymbol(_))));
    assert!(matches!(db.add_stock("TOOLONGSYMBOL").await, Err(CoreError::InvalidSymbol(_))));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_provider_outage_reads_as_not_found() {
    let mut registry = MarketDataRegistry::new();
    registry.register(Box::new(OfflineProvider));
    let mut db = StockDashboard::new(MemoryStore::new(), registry, Settings::default());

    let err = db.add_stock("AAPL").await.unwrap_err();
    assert!(matches!(err, CoreError::StockNotFound(_)));
    assert_eq!(db.store().stock_count(), 0);
}

#[tokio::test]
async fn test_refresh_always_refetches() {
    let (mut db, calls) = dashboard();
    db.add_stock("MSFT").await.unwrap();
    db.refresh_stock("msft").await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(db.price_history("MSFT", 30, today()).unwrap().len(), 2);
    assert!(matches!(db.refresh_stock("NOPE").await, Err(CoreError::StockNotFound(_))));
}

#[tokio::test]
async fn test_sync_service_get_or_fetch() {
    let (provider, calls) = MockMarketProvider::new(&market());
    let mut registry = MarketDataRegistry::new();
    registry.register(Box::new(provider));
    let sync = SyncService::new(registry);
    let mut store = MemoryStore::new();

    let first = sync.get_or_fetch(&mut store, "TSLA", Period::OneMonth).await.unwrap();
    let second = sync.get_or_fetch(&mut store, "TSLA", Period::OneMonth).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(sync.get_or_fetch(&mut store, "NONE", Period::OneMonth).await.unwrap().is_none());
}

// ═══════════════════════════════════════════════════════════════════
// Stock detail
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_stock_detail_fetches_untracked_symbol() {
    let (mut db, calls) = dashboard();
    let detail = db.stock_detail("long", today()).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(detail.stock.symbol, "LONG");
    // 90-day chart window covers all 40 bars
    assert_eq!(detail.history.len(), 40);
    assert_eq!(detail.recent.len(), 10);
    assert_eq!(detail.recent.last().unwrap().close, dec!(40));

    // 30-day indicator window: closes 10..=40
    let ind = detail.indicators.unwrap();
    assert_eq!(ind.sma_10, dec!(35.5));
    assert_eq!(ind.sma_20, dec!(30.5));
    assert_eq!(ind.rsi_14, dec!(100));
    assert_eq!(ind.current_price, dec!(40));
}

#[tokio::test]
async fn test_stock_detail_without_enough_history() {
    let (mut db, _) = dashboard();
    db.add_stock("MSFT").await.unwrap();
    let detail = db.stock_detail("MSFT", today()).await.unwrap();
    assert!(detail.indicators.is_none());
    assert_eq!(detail.recent.len(), 2);
}

#[tokio::test]
async fn test_stock_detail_unknown_symbol() {
    let (mut db, _) = dashboard();
    assert!(matches!(
        db.stock_detail("ZZZZ", today()).await,
        Err(CoreError::StockNotFound(_))
    ));
}

// ═══════════════════════════════════════════════════════════════════
// Search
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_search_local_matches() {
    let (mut db, calls) = dashboard();
    db.add_stock("AAPL").await.unwrap();
    db.add_stock("MSFT").await.unwrap();

    let hits = db.search_stocks("ms", None).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].symbol, "MSFT");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_search_falls_back_to_ticker_lookup() {
    let (mut db, calls) = dashboard();
    let hits = db.search_stocks("tsla", None).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].symbol, "TSLA");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(db.get_stock("TSLA").unwrap().is_some());
}

#[tokio::test]
async fn test_search_does_not_lookup_non_tickers() {
    let (mut db, calls) = dashboard();
    assert!(db.search_stocks("tesla motors", None).await.unwrap().is_empty());
    assert!(db.search_stocks("ABCDEF", None).await.unwrap().is_empty());
    assert!(db.search_stocks("  ", None).await.unwrap().is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_search_unknown_ticker_is_empty() {
    let (mut db, _) = dashboard();
    assert!(db.search_stocks("ZZZZ", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_search_limit_defaults_to_settings() {
    let settings = Settings {
        search_limit: 1,
        ..Settings::default()
    };
    let (mut db, _) = dashboard_with(settings);
    for symbol in ["AAPL", "FLAT", "LONG"] {
        db.add_stock(symbol).await.unwrap();
    }

    assert_eq!(db.search_stocks("l", None).await.unwrap().len(), 1);
    assert_eq!(db.search_stocks("l", Some(3)).await.unwrap().len(), 3);
}

// ═══════════════════════════════════════════════════════════════════
// Portfolio
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_portfolio_merge_and_value() {
    let (mut db, _) = dashboard();
    db.add_stock("AAPL").await.unwrap();

    db.add_to_portfolio(1, "AAPL", dec!(10), dec!(100)).unwrap();
    let merged = db.add_to_portfolio(1, "aapl", dec!(10), dec!(120)).unwrap();
    assert_eq!(merged.quantity, dec!(20));
    assert_eq!(merged.purchase_price, dec!(110));
    assert_eq!(db.holdings(1).unwrap().len(), 1);

    let value = db.portfolio_value(1).unwrap();
    assert_eq!(value.total_value, dec!(2640));
    assert_eq!(value.total_cost, dec!(2200));
    assert_eq!(value.total_gain_loss, dec!(440));
    assert_eq!(value.total_gain_loss_percent, dec!(20));
}

#[tokio::test]
async fn test_portfolio_requires_tracked_stock() {
    let (mut db, _) = dashboard();
    let err = db.add_to_portfolio(1, "AAPL", dec!(1), dec!(1)).unwrap_err();
    assert!(matches!(err, CoreError::StockNotFound(_)));
    assert!(db.holdings(1).unwrap().is_empty());
}

#[tokio::test]
async fn test_portfolio_rejects_invalid_buy() {
    let (mut db, _) = dashboard();
    db.add_stock("AAPL").await.unwrap();
    db.add_to_portfolio(1, "AAPL", dec!(10), dec!(100)).unwrap();

    assert!(matches!(
        db.add_to_portfolio(1, "AAPL", dec!(0), dec!(100)),
        Err(CoreError::Validation(_))
    ));
    assert!(matches!(
        db.add_to_portfolio(1, "AAPL", dec!(1), dec!(-5)),
        Err(CoreError::Validation(_))
    ));
    let holding = &db.holdings(1).unwrap()[0];
    assert_eq!(holding.quantity, dec!(10));
    assert_eq!(holding.purchase_price, dec!(100));
}

#[tokio::test]
async fn test_portfolio_overflow_is_rejected() {
    let (mut db, _) = dashboard();
    db.add_stock("AAPL").await.unwrap();
    db.add_to_portfolio(1, "AAPL", Decimal::MAX, dec!(1)).unwrap();

    let err = db.add_to_portfolio(1, "AAPL", Decimal::MAX, dec!(1)).unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
    assert_eq!(db.holdings(1).unwrap()[0].quantity, Decimal::MAX);

    // AAPL trades at 132, so the position value is out of range
    assert!(matches!(db.portfolio_value(1), Err(CoreError::Validation(_))));
}

#[test]
fn test_empty_portfolio_value() {
    let (db, _) = dashboard();
    let value = db.portfolio_value(42).unwrap();
    assert!(value.is_empty());
    assert_eq!(value.total_gain_loss_percent, Decimal::ZERO);
}

// ═══════════════════════════════════════════════════════════════════
// Market
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_market_summary_and_movers() {
    let (mut db, _) = dashboard();
    for symbol in ["MSFT", "TSLA", "FLAT", "AAPL"] {
        db.add_stock(symbol).await.unwrap();
    }

    let summary = db.market_summary().unwrap();
    assert_eq!(summary.total_stocks, 4);
    assert_eq!(summary.gainers, 2);
    assert_eq!(summary.losers, 1);
    assert_eq!(summary.avg_price, dec!(95.75)); // (102 + 99 + 50 + 132) / 4
    assert_eq!(summary.total_volume, 4_000);

    let movers = db.top_movers(None).unwrap();
    let gainers: Vec<&str> = movers.gainers.iter().map(|s| s.symbol.as_str()).collect();
    assert_eq!(gainers, vec!["AAPL", "MSFT"]);
    assert_eq!(movers.losers[0].symbol, "TSLA");

    let overview = db.market_overview().unwrap();
    assert_eq!(overview.summary, summary);
    assert_eq!(overview.movers.gainers.len(), 2);
}

#[tokio::test]
async fn test_top_movers_default_to_settings() {
    let settings = Settings {
        top_movers_limit: 1,
        ..Settings::default()
    };
    let (mut db, _) = dashboard_with(settings);
    for symbol in ["MSFT", "TSLA", "AAPL"] {
        db.add_stock(symbol).await.unwrap();
    }

    let movers = db.top_movers(None).unwrap();
    assert_eq!(movers.gainers.len(), 1);
    assert_eq!(movers.gainers[0].symbol, "AAPL");
    assert_eq!(db.top_movers(Some(5)).unwrap().gainers.len(), 2);
}

#[test]
fn test_market_summary_empty() {
    let (db, _) = dashboard();
    let summary = db.market_summary().unwrap();
    assert_eq!(summary.total_stocks, 0);
    assert_eq!(summary.avg_price, Decimal::ZERO);
}

#[tokio::test]
async fn test_dashboard_fetches_missing_popular_symbols() {
    let settings = Settings {
        popular_symbols: vec!["AAPL".into(), "MSFT".into(), "GONE".into(), "TSLA".into()],
        dashboard_movers: 1,
        ..Settings::default()
    };
    let (mut db, calls) = dashboard_with(settings);
    db.add_stock("AAPL").await.unwrap();

    let view = db.dashboard().await.unwrap();
    let symbols: Vec<&str> = view.stocks.iter().map(|s| s.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["AAPL", "MSFT", "TSLA"]);
    // AAPL once up front, then MSFT, GONE, TSLA
    assert_eq!(calls.load(Ordering::SeqCst), 4);
    assert_eq!(view.summary.total_stocks, 3);
    assert_eq!(view.movers.gainers.len(), 1);
    assert_eq!(view.movers.gainers[0].symbol, "AAPL");
    assert_eq!(view.movers.losers.len(), 1);
}

// ═══════════════════════════════════════════════════════════════════
// Watchlist
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_watchlist_add_and_remove() {
    let (mut db, _) = dashboard();
    assert!(db.add_to_watchlist(1, "aapl").unwrap());
    assert!(!db.add_to_watchlist(1, "AAPL").unwrap());
    assert!(db.has_unsaved_changes());
    assert_eq!(db.watchlist(1).unwrap()[0].symbol, "AAPL");

    assert!(db.remove_from_watchlist(1, "AAPL").unwrap());
    assert!(!db.remove_from_watchlist(1, "AAPL").unwrap());
    assert!(db.watchlist(1).unwrap().is_empty());
}

#[test]
fn test_watchlist_rejects_bad_symbol() {
    let (mut db, _) = dashboard();
    assert!(matches!(db.add_to_watchlist(1, "$$$"), Err(CoreError::InvalidSymbol(_))));
    assert!(!db.has_unsaved_changes());
}

// ═══════════════════════════════════════════════════════════════════
// Cleanup and persistence
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_cleanup_old_data() {
    let (mut db, _) = dashboard();
    db.add_stock("LONG").await.unwrap();
    db.add_stock("MSFT").await.unwrap();

    // LONG has 40 daily bars; keep the last 31 (today − 30 inclusive)
    let removed = db.cleanup_old_data(Some(30), today()).unwrap();
    assert_eq!(removed, 9);
    assert_eq!(db.price_history("LONG", 365, today()).unwrap().len(), 31);
    assert_eq!(db.price_history("MSFT", 365, today()).unwrap().len(), 2);

    assert!(matches!(db.cleanup_old_data(Some(-1), today()), Err(CoreError::Validation(_))));
}

#[tokio::test]
async fn test_cleanup_defaults_to_retention_setting() {
    let settings = Settings {
        history_retention_days: 10,
        ..Settings::default()
    };
    let (mut db, _) = dashboard_with(settings);
    db.add_stock("LONG").await.unwrap();

    // 40 bars, keep today − 10 through today
    assert_eq!(db.cleanup_old_data(None, today()).unwrap(), 29);
    assert_eq!(db.price_history("LONG", 365, today()).unwrap().len(), 11);
}

#[tokio::test]
async fn test_snapshot_round_trip() {
    let (mut db, _) = dashboard();
    db.add_stock("AAPL").await.unwrap();
    db.add_to_portfolio(7, "AAPL", dec!(3), dec!(90)).unwrap();
    db.add_to_watchlist(7, "MSFT").unwrap();
    assert!(db.has_unsaved_changes());

    let bytes = db.save_to_bytes("open sesame").unwrap();
    assert!(!db.has_unsaved_changes());

    let restored = StockDashboard::load_from_bytes(
        &bytes,
        "open sesame",
        MarketDataRegistry::new(),
        Settings::default(),
    )
    .unwrap();
    assert!(!restored.has_unsaved_changes());
    assert_eq!(restored.store(), db.store());
    assert_eq!(restored.portfolio_value(7).unwrap().total_value, dec!(396));

    let wrong = StockDashboard::load_from_bytes(
        &bytes,
        "wrong",
        MarketDataRegistry::new(),
        Settings::default(),
    );
    assert!(matches!(wrong, Err(CoreError::Decryption)));
}

#[tokio::test]
async fn test_snapshot_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dashboard.stkd");

    let (mut db, _) = dashboard();
    db.add_stock("TSLA").await.unwrap();
    db.save_to_file(&path, "pw").unwrap();

    let restored =
        StockDashboard::load_from_file(&path, "pw", MarketDataRegistry::new(), Settings::default())
            .unwrap();
    assert_eq!(restored.get_stock("TSLA").unwrap().unwrap().current_price, dec!(99));
}
