pub mod exchange;
pub mod persistence;
