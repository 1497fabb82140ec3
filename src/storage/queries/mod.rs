pub mod nav;
pub mod ticker_record;
