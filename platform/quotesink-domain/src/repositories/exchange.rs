use crate::errors::PipelineError;

/// One entry from the exchange metadata endpoint. Only `symbol` and
/// `status` are interpreted; everything else the exchange sends is ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolDescriptor {
    pub symbol: String,
    pub status: String,
}

/// Raw body of a 24h ticker response. Fields are string-encoded numbers as
/// the exchange sends them; an empty string means the field was absent.
/// Parsing happens in the fetch stage, not here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickerSnapshot {
    pub ask_price: String,
    pub ask_qty: String,
    pub bid_price: String,
    pub bid_qty: String,
}

/// Outcome of one per-symbol ticker request. A non-success status is a
/// normal value, not an error: the fetch stage turns it into a skip.
#[derive(Debug, Clone, PartialEq)]
pub enum TickerResponse {
    Snapshot(TickerSnapshot),
    Rejected { status: u16 },
}

/// Read-side collaborator: the exchange REST API. Implementations own the
/// transport; errors they return are request-level failures (the request
/// never completed or the body did not decode), which are fatal.
pub trait ExchangeApi {
    fn exchange_info(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<SymbolDescriptor>, PipelineError>>;

    fn ticker_24hr(
        &self,
        symbol: &str,
    ) -> impl std::future::Future<Output = Result<TickerResponse, PipelineError>>;
}
