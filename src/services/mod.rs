pub mod dividends;
pub mod errors;
pub mod files;
pub mod market_data;
pub mod migration;
pub mod parsers;
pub mod reconciler;
pub mod scrapers;
pub mod shared;
pub mod summary;
