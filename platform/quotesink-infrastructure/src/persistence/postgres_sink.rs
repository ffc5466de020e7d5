use quotesink_domain::errors::PipelineError;
use quotesink_domain::repositories::quote_sink::QuoteSink;
use quotesink_domain::value_objects::ticker_row::TickerRow;
use tokio_postgres::{Client as PgClient, NoTls};

/// Append-only Postgres sink for normalized ticker rows. One connection
/// per run; the schema is created if absent on every run and rows are
/// committed in a single transaction.
pub struct PostgresQuoteSink {
    client: PgClient,
    table: String,
}

impl PostgresQuoteSink {
    pub async fn connect(db_url: &str, table: &str) -> Result<Self, String> {
        validate_table_name(table).map_err(|err| format!("invalid table '{table}': {err}"))?;

        let (client, connection) = tokio_postgres::connect(db_url, NoTls)
            .await
            .map_err(|err| format!("failed to connect to postgres: {err}"))?;
        tokio::spawn(async move {
            if let Err(err) = connection.await {
                tracing::error!(error = %err, "postgres connection error");
            }
        });

        Ok(Self {
            client,
            table: table.to_string(),
        })
    }
}

impl QuoteSink for PostgresQuoteSink {
    async fn ensure_table(&self) -> Result<(), PipelineError> {
        self.client
            .batch_execute(&create_table_sql(&self.table))
            .await
            .map_err(|err| {
                PipelineError::Sink(format!("failed to ensure table {}: {err}", self.table))
            })?;
        tracing::debug!(table = %self.table, "destination table ensured");
        Ok(())
    }

    async fn insert_rows(&mut self, rows: &[TickerRow]) -> Result<u64, PipelineError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let statement = self
            .client
            .prepare(&insert_sql(&self.table))
            .await
            .map_err(|err| PipelineError::Sink(format!("failed to prepare insert: {err}")))?;

        let transaction = self
            .client
            .transaction()
            .await
            .map_err(|err| PipelineError::Sink(format!("failed to start transaction: {err}")))?;

        let mut total = 0u64;
        for row in rows {
            transaction
                .execute(
                    &statement,
                    &[
                        &row.id,
                        &row.symbol,
                        &row.ask_price,
                        &row.ask_size,
                        &row.bid_price,
                        &row.bid_size,
                        &row.time_coinapi,
                        &row.time_exchange,
                        &row.ts,
                    ],
                )
                .await
                .map_err(|err| {
                    PipelineError::Sink(format!("insert failed for {}: {err}", row.symbol))
                })?;
            total += 1;
        }

        transaction
            .commit()
            .await
            .map_err(|err| PipelineError::Sink(format!("failed to commit: {err}")))?;

        metrics::counter!("quotesink.infra.postgres.rows_inserted_total").increment(total);
        tracing::info!(table = %self.table, rows = total, "rows committed");
        Ok(total)
    }
}

/// Create-if-absent DDL for the destination table. No primary key is
/// declared: the table is append-only and reruns add new rows.
pub fn create_table_sql(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            id VARCHAR(50),
            symbol VARCHAR(50),
            ask_price DOUBLE PRECISION,
            ask_size DOUBLE PRECISION,
            bid_price DOUBLE PRECISION,
            bid_size DOUBLE PRECISION,
            time_coinapi TIMESTAMPTZ,
            time_exchange TIMESTAMPTZ,
            ts TIMESTAMPTZ DEFAULT NOW()
        )"
    )
}

fn insert_sql(table: &str) -> String {
    format!(
        "INSERT INTO {table} (
            id, symbol, ask_price, ask_size, bid_price, bid_size,
            time_coinapi, time_exchange, ts
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
    )
}

// The table name comes from configuration and is interpolated into SQL
// text, so it must be a bare identifier or schema.identifier.
fn validate_table_name(table: &str) -> Result<(), String> {
    if table.is_empty() {
        return Err("table name is empty".to_string());
    }
    let parts: Vec<&str> = table.split('.').collect();
    if parts.is_empty() || parts.len() > 2 {
        return Err(format!("invalid table name: {table}"));
    }
    for part in parts {
        let mut chars = part.chars();
        let first = match chars.next() {
            Some(ch) => ch,
            None => return Err(format!("invalid table name: {table}")),
        };
        if !(first.is_ascii_alphabetic() || first == '_') {
            return Err(format!("invalid table name: {table}"));
        }
        if !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
            return Err(format!("invalid table name: {table}"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{create_table_sql, insert_sql, validate_table_name};

    #[test]
    fn create_table_is_idempotent_and_has_all_nine_columns() {
        let sql = create_table_sql("binance_24hr_ticker_data");
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS binance_24hr_ticker_data"));
        for column in [
            "id",
            "symbol",
            "ask_price",
            "ask_size",
            "bid_price",
            "bid_size",
            "time_coinapi",
            "time_exchange",
            "ts",
        ] {
            assert!(sql.contains(column), "missing column {column}");
        }
        assert!(sql.contains("ts TIMESTAMPTZ DEFAULT NOW()"));
        assert!(!sql.contains("PRIMARY KEY"));
    }

    #[test]
    fn insert_binds_all_columns_positionally() {
        let sql = insert_sql("binance_24hr_ticker_data");
        assert!(sql.contains("$9"));
        assert!(!sql.contains("$10"));
        assert!(sql.starts_with("INSERT INTO binance_24hr_ticker_data"));
    }

    #[test]
    fn validate_table_name_accepts_schema_qualified_identifiers() {
        assert!(validate_table_name("binance_24hr_ticker_data").is_ok());
        assert!(validate_table_name("public.binance_24hr_ticker_data").is_ok());
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("ticker;drop").is_err());
        assert!(validate_table_name("a.b.c").is_err());
        assert!(validate_table_name("1table").is_err());
    }
}
