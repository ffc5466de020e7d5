pub mod exchange;
pub mod quote_sink;
