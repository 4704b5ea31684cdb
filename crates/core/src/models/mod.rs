pub mod history;
pub mod holding;
pub mod indicators;
pub mod market;
pub mod settings;
pub mod stock;
pub mod valuation;
pub mod watchlist;
