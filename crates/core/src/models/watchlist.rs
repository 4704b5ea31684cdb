use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::holding::UserId;

/// A symbol a user follows without holding it. Unique per `(user_id, symbol)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub user_id: UserId,
    pub symbol: String,
    pub added_at: DateTime<Utc>,
}

impl WatchlistEntry {
    pub fn new(user_id: UserId, symbol: impl Into<String>, added_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            symbol: symbol.into().to_uppercase(),
            added_at,
        }
    }
}
