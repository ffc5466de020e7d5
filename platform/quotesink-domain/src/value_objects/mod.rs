pub mod quote;
pub mod ticker_row;
