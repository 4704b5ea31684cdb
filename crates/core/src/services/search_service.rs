use crate::models::stock::StockRecord;

/// Default cap on search results.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Longest query treated as a possible ticker when nothing matches.
pub const MAX_TICKER_QUERY_LEN: usize = 5;

/// Case-insensitive substring search over symbol and name.
pub struct SearchService;

impl SearchService {
    pub fn new() -> Self {
        Self
    }

    /// Records whose symbol or name contains `query`, in stored order,
    /// capped at `limit`. A blank query matches nothing.
    pub fn search<'a>(&self, stocks: &'a [StockRecord], query: &str, limit: usize) -> Vec<&'a StockRecord> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        stocks
            .iter()
            .filter(|s| {
                s.symbol.to_lowercase().contains(&needle) || s.name.to_lowercase().contains(&needle)
            })
            .take(limit)
            .collect()
    }

    /// Whether an unmatched query is worth trying as an unknown ticker:
    /// 1 to 5 letters, nothing else.
    pub fn looks_like_ticker(query: &str) -> bool {
        let query = query.trim();
        !query.is_empty()
            && query.chars().count() <= MAX_TICKER_QUERY_LEN
            && query.chars().all(|c| c.is_ascii_alphabetic())
    }
}

impl Default for SearchService {
    fn default() -> Self {
        Self::new()
    }
}
