use quotesink_application::pipeline::{
    discover_symbols, fetch_quotes, load_rows, normalize_quotes, run_pipeline,
};
use quotesink_domain::errors::{PipelineError, SkipReason};
use quotesink_domain::repositories::exchange::{
    ExchangeApi, SymbolDescriptor, TickerResponse, TickerSnapshot,
};
use quotesink_domain::repositories::quote_sink::QuoteSink;
use quotesink_domain::value_objects::ticker_row::TickerRow;
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Default)]
struct FakeExchangeApi {
    descriptors: Vec<SymbolDescriptor>,
    discovery_error: Option<PipelineError>,
    tickers: HashMap<String, TickerResponse>,
    requested: RefCell<Vec<String>>,
}

impl ExchangeApi for FakeExchangeApi {
    async fn exchange_info(&self) -> Result<Vec<SymbolDescriptor>, PipelineError> {
        if let Some(err) = &self.discovery_error {
            return Err(err.clone());
        }
        Ok(self.descriptors.clone())
    }

    async fn ticker_24hr(&self, symbol: &str) -> Result<TickerResponse, PipelineError> {
        self.requested.borrow_mut().push(symbol.to_string());
        match self.tickers.get(symbol) {
            Some(response) => Ok(response.clone()),
            None => Err(PipelineError::Http(format!("no route for {symbol}"))),
        }
    }
}

#[derive(Default)]
struct RecordingSink {
    ensure_calls: RefCell<usize>,
    rows: RefCell<Vec<TickerRow>>,
    ensured_before_insert: RefCell<Option<bool>>,
    insert_error: Option<PipelineError>,
}

impl QuoteSink for RecordingSink {
    async fn ensure_table(&self) -> Result<(), PipelineError> {
        *self.ensure_calls.borrow_mut() += 1;
        Ok(())
    }

    async fn insert_rows(&mut self, rows: &[TickerRow]) -> Result<u64, PipelineError> {
        if let Some(err) = &self.insert_error {
            return Err(err.clone());
        }
        *self.ensured_before_insert.borrow_mut() = Some(*self.ensure_calls.borrow() > 0);
        self.rows.borrow_mut().extend_from_slice(rows);
        Ok(rows.len() as u64)
    }
}

fn descriptor(symbol: &str, status: &str) -> SymbolDescriptor {
    SymbolDescriptor {
        symbol: symbol.to_string(),
        status: status.to_string(),
    }
}

fn snapshot(ask_price: &str, ask_qty: &str, bid_price: &str, bid_qty: &str) -> TickerResponse {
    TickerResponse::Snapshot(TickerSnapshot {
        ask_price: ask_price.to_string(),
        ask_qty: ask_qty.to_string(),
        bid_price: bid_price.to_string(),
        bid_qty: bid_qty.to_string(),
    })
}

#[tokio::test]
async fn discovery_keeps_only_trading_symbols_in_source_order() {
    let api = FakeExchangeApi {
        descriptors: vec![
            descriptor("BTCUSDT", "TRADING"),
            descriptor("XYZ", "BREAK"),
            descriptor("ETHUSDT", "TRADING"),
            descriptor("OLDCOIN", "DELISTED"),
        ],
        ..FakeExchangeApi::default()
    };

    let symbols = discover_symbols(&api).await.expect("discovery");
    assert_eq!(symbols, vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()]);
}

#[tokio::test]
async fn discovery_failure_is_fatal() {
    let api = FakeExchangeApi {
        discovery_error: Some(PipelineError::Transport {
            endpoint: "/exchangeInfo".to_string(),
            status: 503,
        }),
        ..FakeExchangeApi::default()
    };

    let err = discover_symbols(&api).await.unwrap_err();
    assert_eq!(
        err,
        PipelineError::Transport {
            endpoint: "/exchangeInfo".to_string(),
            status: 503,
        }
    );
}

#[tokio::test]
async fn fetch_skips_rejected_symbols_and_keeps_input_order() {
    let mut tickers = HashMap::new();
    tickers.insert("A".to_string(), snapshot("1.0", "2.0", "3.0", "4.0"));
    tickers.insert("B".to_string(), TickerResponse::Rejected { status: 500 });
    tickers.insert("C".to_string(), snapshot("5.0", "6.0", "7.0", "8.0"));
    let api = FakeExchangeApi {
        tickers,
        ..FakeExchangeApi::default()
    };

    let symbols = vec!["A".to_string(), "B".to_string(), "C".to_string()];
    let report = fetch_quotes(&api, &symbols, Duration::ZERO)
        .await
        .expect("fetch");

    assert_eq!(report.quotes.len(), 2);
    assert_eq!(report.quotes[0].symbol, "A");
    assert_eq!(report.quotes[0].id, "A");
    assert_eq!(report.quotes[1].symbol, "C");
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].symbol, "B");
    assert_eq!(report.skipped[0].reason, SkipReason::HttpStatus(500));
    assert_eq!(*api.requested.borrow(), symbols);
}

#[tokio::test]
async fn fetch_maps_empty_fields_to_none() {
    let mut tickers = HashMap::new();
    tickers.insert("BTCUSDT".to_string(), snapshot("", "1.5", "100.2", "2.0"));
    let api = FakeExchangeApi {
        tickers,
        ..FakeExchangeApi::default()
    };

    let report = fetch_quotes(&api, &["BTCUSDT".to_string()], Duration::ZERO)
        .await
        .expect("fetch");

    let quote = &report.quotes[0];
    assert_eq!(quote.ask_price, None);
    assert_eq!(quote.ask_size, Some(1.5));
    assert_eq!(quote.bid_price, Some(100.2));
    assert_eq!(quote.bid_size, Some(2.0));
}

#[tokio::test]
async fn fetch_malformed_number_is_fatal() {
    let mut tickers = HashMap::new();
    tickers.insert("BTCUSDT".to_string(), snapshot("not-a-price", "1", "2", "3"));
    let api = FakeExchangeApi {
        tickers,
        ..FakeExchangeApi::default()
    };

    let err = fetch_quotes(&api, &["BTCUSDT".to_string()], Duration::ZERO)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Parse(_)));
}

#[tokio::test]
async fn load_ensures_table_before_inserting_and_reports_count() {
    let mut tickers = HashMap::new();
    tickers.insert("A".to_string(), snapshot("1", "2", "3", "4"));
    tickers.insert("B".to_string(), snapshot("5", "6", "7", "8"));
    let api = FakeExchangeApi {
        tickers,
        ..FakeExchangeApi::default()
    };

    let symbols = vec!["A".to_string(), "B".to_string()];
    let report = fetch_quotes(&api, &symbols, Duration::ZERO)
        .await
        .expect("fetch");
    let rows = normalize_quotes(&report.quotes);
    assert_eq!(rows.len(), report.quotes.len());

    let mut sink = RecordingSink::default();
    let inserted = load_rows(&mut sink, &rows).await.expect("load");

    assert_eq!(inserted, 2);
    assert_eq!(*sink.ensure_calls.borrow(), 1);
    assert_eq!(*sink.ensured_before_insert.borrow(), Some(true));
    let stored = sink.rows.borrow();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].id, "A");
    assert_eq!(stored[0].time_coinapi, stored[0].ts);
    assert_eq!(stored[0].time_exchange, stored[0].ts);
}

#[tokio::test]
async fn sink_failure_is_fatal() {
    let mut sink = RecordingSink {
        insert_error: Some(PipelineError::Sink("insert failed".to_string())),
        ..RecordingSink::default()
    };
    let err = load_rows(&mut sink, &[]).await.unwrap_err();
    assert_eq!(err, PipelineError::Sink("insert failed".to_string()));
}

#[tokio::test]
async fn run_pipeline_chains_all_four_stages() {
    let mut tickers = HashMap::new();
    tickers.insert("BTCUSDT".to_string(), snapshot("61000.5", "0.01", "60999.0", "0.02"));
    tickers.insert("ETHUSDT".to_string(), TickerResponse::Rejected { status: 429 });
    let api = FakeExchangeApi {
        descriptors: vec![
            descriptor("BTCUSDT", "TRADING"),
            descriptor("ETHUSDT", "TRADING"),
            descriptor("XYZ", "BREAK"),
        ],
        tickers,
        ..FakeExchangeApi::default()
    };
    let mut sink = RecordingSink::default();

    let summary = run_pipeline(&api, &mut sink, Duration::ZERO)
        .await
        .expect("run");

    assert_eq!(summary.discovered, 2);
    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.inserted, 1);

    let stored = sink.rows.borrow();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].symbol, "BTCUSDT");
    assert_eq!(stored[0].ask_price, Some(61000.5));
    assert_eq!(stored[0].bid_size, Some(0.02));
    // untradable XYZ was never fetched
    assert_eq!(
        *api.requested.borrow(),
        vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()]
    );
}
