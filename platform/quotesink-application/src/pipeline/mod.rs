use chrono::Utc;
use quotesink_domain::errors::{PipelineError, SkipReason};
use quotesink_domain::repositories::exchange::{ExchangeApi, TickerResponse};
use quotesink_domain::repositories::quote_sink::QuoteSink;
use quotesink_domain::value_objects::quote::QuoteRecord;
use quotesink_domain::value_objects::ticker_row::TickerRow;
use std::time::Duration;

/// Exchange status value marking a pair as currently tradable.
const TRADABLE_STATUS: &str = "TRADING";

/// A symbol dropped during a fetch pass, with the reason it was dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSymbol {
    pub symbol: String,
    pub reason: SkipReason,
}

/// Fetch-stage output: successful quotes in request order, plus every
/// skipped symbol so callers can see what a run silently lost.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchReport {
    pub quotes: Vec<QuoteRecord>,
    pub skipped: Vec<SkippedSymbol>,
}

/// Counters for one full pipeline run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub discovered: usize,
    pub fetched: usize,
    pub skipped: usize,
    pub inserted: u64,
}

/// Stage 1: list the symbols currently open for trading, in the order the
/// exchange reports them. A non-success discovery response is fatal; the
/// run never proceeds on a partial symbol list.
pub async fn discover_symbols<A: ExchangeApi>(api: &A) -> Result<Vec<String>, PipelineError> {
    let descriptors = api.exchange_info().await?;
    let symbols: Vec<String> = descriptors
        .into_iter()
        .filter(|descriptor| descriptor.status == TRADABLE_STATUS)
        .map(|descriptor| descriptor.symbol)
        .collect();
    tracing::info!(symbols = symbols.len(), "symbol discovery complete");
    Ok(symbols)
}

/// Stage 2: one sequential ticker request per symbol. A rejected response
/// (non-success status) drops that symbol and the run continues; a request
/// that never completes, or a body that does not parse, aborts the run.
pub async fn fetch_quotes<A: ExchangeApi>(
    api: &A,
    symbols: &[String],
    request_delay: Duration,
) -> Result<FetchReport, PipelineError> {
    let mut report = FetchReport::default();

    for (index, symbol) in symbols.iter().enumerate() {
        if index > 0 && !request_delay.is_zero() {
            tokio::time::sleep(request_delay).await;
        }

        match api.ticker_24hr(symbol).await? {
            TickerResponse::Snapshot(snapshot) => {
                let ts = Utc::now();
                report.quotes.push(QuoteRecord {
                    id: symbol.clone(),
                    symbol: symbol.clone(),
                    ask_price: parse_quote_field(&snapshot.ask_price, symbol, "askPrice")?,
                    ask_size: parse_quote_field(&snapshot.ask_qty, symbol, "askQty")?,
                    bid_price: parse_quote_field(&snapshot.bid_price, symbol, "bidPrice")?,
                    bid_size: parse_quote_field(&snapshot.bid_qty, symbol, "bidQty")?,
                    ts,
                });
            }
            TickerResponse::Rejected { status } => {
                tracing::warn!(symbol = %symbol, status, "ticker fetch rejected, skipping symbol");
                report.skipped.push(SkippedSymbol {
                    symbol: symbol.clone(),
                    reason: SkipReason::HttpStatus(status),
                });
            }
        }
    }

    tracing::info!(
        fetched = report.quotes.len(),
        skipped = report.skipped.len(),
        "quote fetch complete"
    );
    Ok(report)
}

/// Stage 3: pure 1:1 reshaping into the table schema. `time_coinapi` and
/// `time_exchange` are both the fetch timestamp; the table carries the
/// duplicate on purpose.
pub fn normalize_quotes(quotes: &[QuoteRecord]) -> Vec<TickerRow> {
    quotes
        .iter()
        .map(|quote| TickerRow {
            id: quote.id.clone(),
            symbol: quote.symbol.clone(),
            ask_price: quote.ask_price,
            ask_size: quote.ask_size,
            bid_price: quote.bid_price,
            bid_size: quote.bid_size,
            time_coinapi: quote.ts,
            time_exchange: quote.ts,
            ts: quote.ts,
        })
        .collect()
}

/// Stage 4: create-if-absent, then append every row in one committed
/// transaction. Returns the inserted count.
pub async fn load_rows<S: QuoteSink>(
    sink: &mut S,
    rows: &[TickerRow],
) -> Result<u64, PipelineError> {
    sink.ensure_table().await?;
    let inserted = sink.insert_rows(rows).await?;
    tracing::info!(inserted, "sink load complete");
    Ok(inserted)
}

/// Runs the four stages in order, each consuming the previous stage's full
/// output. One call per scheduler tick; reruns append new rows.
pub async fn run_pipeline<A: ExchangeApi, S: QuoteSink>(
    api: &A,
    sink: &mut S,
    request_delay: Duration,
) -> Result<RunSummary, PipelineError> {
    let symbols = discover_symbols(api).await?;
    let report = fetch_quotes(api, &symbols, request_delay).await?;
    let rows = normalize_quotes(&report.quotes);
    let inserted = load_rows(sink, &rows).await?;

    Ok(RunSummary {
        discovered: symbols.len(),
        fetched: report.quotes.len(),
        skipped: report.skipped.len(),
        inserted,
    })
}

fn parse_quote_field(
    raw: &str,
    symbol: &str,
    field: &str,
) -> Result<Option<f64>, PipelineError> {
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>().map(Some).map_err(|_| {
        PipelineError::Parse(format!("invalid {field} for {symbol}: {raw:?}"))
    })
}
