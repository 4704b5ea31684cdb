pub mod indicator_service;
pub mod market_service;
pub mod position_service;
pub mod search_service;
pub mod sync_service;
pub mod valuation_service;
