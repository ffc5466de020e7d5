use quotesink_domain::errors::PipelineError;
use quotesink_domain::repositories::exchange::{
    ExchangeApi, SymbolDescriptor, TickerResponse, TickerSnapshot,
};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Binance spot REST adapter. The base URL and timeout are injected so
/// tests can point this at a local stub and no request can hang forever.
#[derive(Debug, Clone)]
pub struct BinanceApi {
    http: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ExchangeInfoBody {
    symbols: Vec<ExchangeSymbol>,
}

#[derive(Debug, Deserialize)]
struct ExchangeSymbol {
    symbol: String,
    status: String,
}

// Binance sends string-encoded numbers; an omitted field decodes to "".
#[derive(Debug, Deserialize)]
struct TickerBody {
    #[serde(default, rename = "askPrice")]
    ask_price: String,
    #[serde(default, rename = "askQty")]
    ask_qty: String,
    #[serde(default, rename = "bidPrice")]
    bid_price: String,
    #[serde(default, rename = "bidQty")]
    bid_qty: String,
}

impl BinanceApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, String> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| format!("failed to build HTTP client: {err}"))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl ExchangeApi for BinanceApi {
    async fn exchange_info(&self) -> Result<Vec<SymbolDescriptor>, PipelineError> {
        let url = format!("{}/exchangeInfo", self.base_url);
        let response = self.http.get(&url).send().await.map_err(|err| {
            metrics::counter!("quotesink.infra.binance.requests_total", "endpoint" => "exchange_info", "result" => "err")
                .increment(1);
            PipelineError::Http(format!("exchangeInfo request failed: {err}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            metrics::counter!("quotesink.infra.binance.requests_total", "endpoint" => "exchange_info", "result" => "err")
                .increment(1);
            tracing::error!(status = status.as_u16(), "exchangeInfo returned non-success");
            return Err(PipelineError::Transport {
                endpoint: "/exchangeInfo".to_string(),
                status: status.as_u16(),
            });
        }

        let body: ExchangeInfoBody = response.json().await.map_err(|err| {
            PipelineError::Parse(format!("exchangeInfo decode failed: {err}"))
        })?;
        metrics::counter!("quotesink.infra.binance.requests_total", "endpoint" => "exchange_info", "result" => "ok")
            .increment(1);

        Ok(body
            .symbols
            .into_iter()
            .map(|entry| SymbolDescriptor {
                symbol: entry.symbol,
                status: entry.status,
            })
            .collect())
    }

    async fn ticker_24hr(&self, symbol: &str) -> Result<TickerResponse, PipelineError> {
        let url = format!("{}/ticker/24hr", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("symbol", symbol)])
            .send()
            .await
            .map_err(|err| {
                metrics::counter!("quotesink.infra.binance.requests_total", "endpoint" => "ticker_24hr", "result" => "err")
                    .increment(1);
                PipelineError::Http(format!("ticker request for {symbol} failed: {err}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            // Per-symbol rejection is a value, not an error; the fetch
            // stage decides to skip and keep going.
            metrics::counter!("quotesink.infra.binance.requests_total", "endpoint" => "ticker_24hr", "result" => "rejected")
                .increment(1);
            return Ok(TickerResponse::Rejected {
                status: status.as_u16(),
            });
        }

        let body: TickerBody = response.json().await.map_err(|err| {
            PipelineError::Parse(format!("ticker decode for {symbol} failed: {err}"))
        })?;
        metrics::counter!("quotesink.infra.binance.requests_total", "endpoint" => "ticker_24hr", "result" => "ok")
            .increment(1);

        Ok(TickerResponse::Snapshot(TickerSnapshot {
            ask_price: body.ask_price,
            ask_qty: body.ask_qty,
            bid_price: body.bid_price,
            bid_qty: body.bid_qty,
        }))
    }
}
