//! Persistence collaborator: the document store the dashboard reads and writes.

pub mod encryption;
pub mod format;
pub mod memory;
pub mod snapshot;

use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::models::history::PriceHistoryPoint;
use crate::models::holding::{HoldingPosition, UserId};
use crate::models::stock::StockRecord;
use crate::models::watchlist::WatchlistEntry;

/// Document-store operations the core relies on.
///
/// Writes take `&mut self`: a caller holding the store mutably is the only
/// writer, so a read-modify-write of a holding cannot interleave with
/// another. Implementations backed by a shared database must provide the
/// same guarantee (atomic upsert or a per-key transaction).
///
/// Symbols passed in are matched case-insensitively.
pub trait StockStore: Send + Sync {
    fn find_stock(&self, symbol: &str) -> Result<Option<StockRecord>, CoreError>;

    /// Up to `limit` records in collection (insertion) order.
    fn find_all_stocks(&self, limit: usize) -> Result<Vec<StockRecord>, CoreError>;

    /// Insert, or replace the whole record with the same symbol.
    fn upsert_stock(&mut self, record: StockRecord) -> Result<(), CoreError>;

    fn find_holding(
        &self,
        user_id: UserId,
        symbol: &str,
    ) -> Result<Option<HoldingPosition>, CoreError>;

    fn find_holdings(&self, user_id: UserId) -> Result<Vec<HoldingPosition>, CoreError>;

    /// Insert, or replace the position with the same `(user_id, symbol)`.
    fn upsert_holding(&mut self, position: HoldingPosition) -> Result<(), CoreError>;

    /// Drop every stored bar for `symbol` and store `points` instead.
    fn replace_price_history(
        &mut self,
        symbol: &str,
        points: Vec<PriceHistoryPoint>,
    ) -> Result<(), CoreError>;

    /// Bars for `symbol` dated on or after `since`, oldest first.
    fn price_history(
        &self,
        symbol: &str,
        since: NaiveDate,
    ) -> Result<Vec<PriceHistoryPoint>, CoreError>;

    /// Delete bars of every symbol dated before `cutoff`. Returns how many were removed.
    fn delete_price_history_before(&mut self, cutoff: NaiveDate) -> Result<usize, CoreError>;

    /// Returns false if the `(user_id, symbol)` pair was already present.
    fn add_watchlist_entry(&mut self, entry: WatchlistEntry) -> Result<bool, CoreError>;

    /// Returns false if there was nothing to remove.
    fn remove_watchlist_entry(&mut self, user_id: UserId, symbol: &str)
        -> Result<bool, CoreError>;

    /// A user's watchlist, newest first.
    fn find_watchlist(&self, user_id: UserId) -> Result<Vec<WatchlistEntry>, CoreError>;
}
