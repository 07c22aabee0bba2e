pub mod date_range;
pub mod error;
pub mod sales;
pub mod visitor;
pub mod weather;
