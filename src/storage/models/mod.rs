pub mod dividend;
pub mod nav;
pub mod ticker;
