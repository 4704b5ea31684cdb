use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::CoreError;
use crate::models::history::PriceHistoryPoint;
use crate::models::holding::{HoldingPosition, UserId};
use crate::models::stock::StockRecord;
use crate::models::watchlist::WatchlistEntry;

use super::StockStore;

/// In-process document store.
///
/// Collections mirror the dashboard's document collections: stocks (unique
/// by symbol), price history grouped per symbol, holdings (unique by
/// user + symbol) and watchlists. The whole store serializes as one value,
/// which is what `SnapshotManager` encrypts to disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStore {
    /// Insertion-ordered; an upsert replaces in place and keeps the slot
    stocks: Vec<StockRecord>,

    /// Symbol → bars sorted by date
    price_history: BTreeMap<String, Vec<PriceHistoryPoint>>,

    holdings: Vec<HoldingPosition>,

    watchlist: Vec<WatchlistEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stock_count(&self) -> usize {
        self.stocks.len()
    }

    /// Total bars stored across all symbols.
    pub fn history_len(&self) -> usize {
        self.price_history.values().map(Vec::len).sum()
    }

    pub fn holding_count(&self) -> usize {
        self.holdings.len()
    }
}

impl StockStore for MemoryStore {
    fn find_stock(&self, symbol: &str) -> Result<Option<StockRecord>, CoreError> {
        let symbol = symbol.to_uppercase();
        Ok(self.stocks.iter().find(|s| s.symbol == symbol).cloned())
    }

    fn find_all_stocks(&self, limit: usize) -> Result<Vec<StockRecord>, CoreError> {
        Ok(self.stocks.iter().take(limit).cloned().collect())
    }

    fn upsert_stock(&mut self, mut record: StockRecord) -> Result<(), CoreError> {
        record.symbol = record.symbol.to_uppercase();
        match self.stocks.iter_mut().find(|s| s.symbol == record.symbol) {
            Some(existing) => *existing = record,
            None => self.stocks.push(record),
        }
        Ok(())
    }

    fn find_holding(
        &self,
        user_id: UserId,
        symbol: &str,
    ) -> Result<Option<HoldingPosition>, CoreError> {
        let symbol = symbol.to_uppercase();
        Ok(self
            .holdings
            .iter()
            .find(|h| h.user_id == user_id && h.symbol == symbol)
            .cloned())
    }

    fn find_holdings(&self, user_id: UserId) -> Result<Vec<HoldingPosition>, CoreError> {
        Ok(self
            .holdings
            .iter()
            .filter(|h| h.user_id == user_id)
            .cloned()
            .collect())
    }

    fn upsert_holding(&mut self, mut position: HoldingPosition) -> Result<(), CoreError> {
        position.symbol = position.symbol.to_uppercase();
        match self
            .holdings
            .iter_mut()
            .find(|h| h.user_id == position.user_id && h.symbol == position.symbol)
        {
            Some(existing) => *existing = position,
            None => self.holdings.push(position),
        }
        Ok(())
    }

    fn replace_price_history(
        &mut self,
        symbol: &str,
        mut points: Vec<PriceHistoryPoint>,
    ) -> Result<(), CoreError> {
        let symbol = symbol.to_uppercase();
        if let Some(stray) = points.iter().find(|p| !p.symbol.eq_ignore_ascii_case(&symbol)) {
            return Err(CoreError::Store(format!(
                "price history for {symbol} contains a bar for {}",
                stray.symbol
            )));
        }
        if points.is_empty() {
            self.price_history.remove(&symbol);
            return Ok(());
        }
        for p in &mut points {
            p.symbol.clone_from(&symbol);
        }
        points.sort_by_key(|p| p.date);
        self.price_history.insert(symbol, points);
        Ok(())
    }

    fn price_history(
        &self,
        symbol: &str,
        since: NaiveDate,
    ) -> Result<Vec<PriceHistoryPoint>, CoreError> {
        let Some(points) = self.price_history.get(&symbol.to_uppercase()) else {
            return Ok(Vec::new());
        };
        // Sorted by date: find the first bar >= since
        let start = points.partition_point(|p| p.date < since);
        Ok(points[start..].to_vec())
    }

    fn delete_price_history_before(&mut self, cutoff: NaiveDate) -> Result<usize, CoreError> {
        let mut removed = 0;
        for points in self.price_history.values_mut() {
            let split = points.partition_point(|p| p.date < cutoff);
            points.drain(..split);
            removed += split;
        }
        self.price_history.retain(|_, v| !v.is_empty());
        Ok(removed)
    }

    fn add_watchlist_entry(&mut self, mut entry: WatchlistEntry) -> Result<bool, CoreError> {
        entry.symbol = entry.symbol.to_uppercase();
        if self
            .watchlist
            .iter()
            .any(|w| w.user_id == entry.user_id && w.symbol == entry.symbol)
        {
            return Ok(false);
        }
        self.watchlist.push(entry);
        Ok(true)
    }

    fn remove_watchlist_entry(
        &mut self,
        user_id: UserId,
        symbol: &str,
    ) -> Result<bool, CoreError> {
        let symbol = symbol.to_uppercase();
        let before = self.watchlist.len();
        self.watchlist
            .retain(|w| !(w.user_id == user_id && w.symbol == symbol));
        Ok(self.watchlist.len() != before)
    }

    fn find_watchlist(&self, user_id: UserId) -> Result<Vec<WatchlistEntry>, CoreError> {
        let mut entries: Vec<WatchlistEntry> = self
            .watchlist
            .iter()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect();
        // Stable sort: same-instant entries keep insertion order
        entries.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        Ok(entries)
    }
}
