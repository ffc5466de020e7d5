use clap::Parser;
use quotesink_application::config::{load_config, ApiConfig, DbConfig, PipelineConfig};
use quotesink_application::pipeline::run_pipeline;
use quotesink_infrastructure::exchange::binance::BinanceApi;
use quotesink_infrastructure::persistence::postgres_sink::PostgresQuoteSink;
use std::path::PathBuf;
use std::time::Duration;

mod obs;

/// One-shot ETL run: discover tradable symbols, snapshot each 24h ticker,
/// append the normalized rows. The external scheduler owns triggering,
/// retries, and keeping runs from overlapping.
#[derive(Parser)]
#[command(name = "quotesink-ingest")]
#[command(about = "Binance 24h ticker ingestion into PostgreSQL.", version)]
struct Cli {
    /// Optional TOML config file; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, env = "QUOTESINK_DB_URL")]
    db_url: Option<String>,
    #[arg(long)]
    base_url: Option<String>,
    #[arg(long)]
    table: Option<String>,
    #[arg(long)]
    timeout_secs: Option<u64>,
    #[arg(long)]
    request_delay_ms: Option<u64>,
    #[arg(long, default_value = "info")]
    log_level: String,
    #[arg(long, default_value = "text")]
    log_format: String,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let cli = Cli::parse();
    obs::init_tracing(&cli.log_level, &cli.log_format)?;
    let config = resolve_config(&cli)?;

    let api = BinanceApi::new(
        config.base_url(),
        Duration::from_secs(config.timeout_secs()),
    )?;
    let mut sink = PostgresQuoteSink::connect(&config.db.url, config.table()).await?;

    let summary = run_pipeline(
        &api,
        &mut sink,
        Duration::from_millis(config.request_delay_ms()),
    )
    .await
    .map_err(|err| err.to_string())?;

    if summary.skipped > 0 {
        tracing::warn!(skipped = summary.skipped, "symbols dropped this run");
    }

    println!(
        "ingest complete: discovered={} fetched={} skipped={} inserted={}",
        summary.discovered, summary.fetched, summary.skipped, summary.inserted
    );
    Ok(())
}

fn resolve_config(cli: &Cli) -> Result<PipelineConfig, String> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => PipelineConfig {
            api: ApiConfig {
                base_url: None,
                timeout_secs: None,
                request_delay_ms: None,
            },
            db: DbConfig {
                url: String::new(),
                table: None,
            },
        },
    };

    if let Some(url) = &cli.db_url {
        config.db.url = url.clone();
    }
    if config.db.url.is_empty() {
        return Err(
            "database url required: pass --db-url (or QUOTESINK_DB_URL) or set db.url in the config file"
                .to_string(),
        );
    }
    if let Some(base_url) = &cli.base_url {
        config.api.base_url = Some(base_url.clone());
    }
    if let Some(table) = &cli.table {
        config.db.table = Some(table.clone());
    }
    if let Some(timeout_secs) = cli.timeout_secs {
        config.api.timeout_secs = Some(timeout_secs);
    }
    if let Some(request_delay_ms) = cli.request_delay_ms {
        config.api.request_delay_ms = Some(request_delay_ms);
    }
    Ok(config)
}
