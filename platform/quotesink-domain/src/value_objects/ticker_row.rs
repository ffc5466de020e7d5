use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A quote shaped for the destination table. `time_coinapi` and
/// `time_exchange` both carry the fetch timestamp; the duplication is part
/// of the table contract and must not be given distinct meanings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerRow {
    pub id: String,
    pub symbol: String,
    pub ask_price: Option<f64>,
    pub ask_size: Option<f64>,
    pub bid_price: Option<f64>,
    pub bid_size: Option<f64>,
    pub time_coinapi: DateTime<Utc>,
    pub time_exchange: DateTime<Utc>,
    pub ts: DateTime<Utc>,
}
