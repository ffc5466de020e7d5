use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One successfully fetched 24h ticker observation. Price/size fields are
/// `None` when the exchange sent an empty string for them; `ts` is the
/// local wall-clock time the fetch completed, not an exchange timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub id: String,
    pub symbol: String,
    pub ask_price: Option<f64>,
    pub ask_size: Option<f64>,
    pub bid_price: Option<f64>,
    pub bid_size: Option<f64>,
    pub ts: DateTime<Utc>,
}
