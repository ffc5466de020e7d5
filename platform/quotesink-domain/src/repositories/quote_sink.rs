use crate::errors::PipelineError;
use crate::value_objects::ticker_row::TickerRow;

/// Write-side collaborator: the durable table the pipeline appends to.
///
/// `ensure_table` must be safe to call on every run (create-if-absent
/// semantics). `insert_rows` writes every row inside a single transaction
/// with one commit at the end and returns the inserted count.
pub trait QuoteSink {
    fn ensure_table(&self) -> impl std::future::Future<Output = Result<(), PipelineError>>;

    fn insert_rows(
        &mut self,
        rows: &[TickerRow],
    ) -> impl std::future::Future<Output = Result<u64, PipelineError>>;
}
