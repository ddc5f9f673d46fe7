use std::sync::Arc;

use futures::future::join_all;

use crate::{
    application::{AppError, AppResult, BlockExtractor, ExtractError, RowSink},
    domain::{Block, CandidateRecord, TableName},
};

#[derive(Debug)]
pub enum RowOutcome {
    Stored,
    Failed(AppError),
}

/// What a settled block pass did.
#[derive(Debug, Default)]
pub struct PassReport {
    pub block_height: u64,
    pub attempted: usize,
    pub stored: usize,
    pub failures: Vec<(CandidateRecord, AppError)>,
    pub skipped: Vec<ExtractError>,
}

/// Runs one indexer function over a block: extract, then write every
/// candidate record to the sink concurrently and wait for all of them.
pub struct BlockProcessor {
    extractor: Arc<dyn BlockExtractor>,
    sink: Arc<dyn RowSink>,
    table: TableName,
}

impl BlockProcessor {
    pub fn new(extractor: Arc<dyn BlockExtractor>, sink: Arc<dyn RowSink>, table: TableName) -> Self {
        Self { extractor, sink, table }
    }

    pub fn name(&self) -> &str {
        self.extractor.name()
    }

    /// Errors only when the sink itself is unusable. Individual row
    /// failures are logged and reported in the returned `PassReport`.
    pub async fn process(&self, block: &Block) -> AppResult<PassReport> {
        let block_height = block.height();
        let extraction = self.extractor.extract(block);

        let mut report = PassReport {
            block_height,
            skipped: extraction.skipped,
            ..Default::default()
        };

        if extraction.records.is_empty() {
            tracing::debug!(block_height, extractor = self.name(), "No candidate records");
            return Ok(report);
        }

        tracing::info!(
            block_height,
            block_hash = ?block.header.hash,
            block_time = ?block.header.timestamp(),
            extractor = self.name(),
            count = extraction.records.len(),
            "Found matching activity"
        );
        for record in &extraction.records {
            match serde_json::to_string(record) {
                Ok(json) => tracing::info!(block_height, table = %self.table, record = %json, "Candidate record"),
                Err(_) => tracing::info!(block_height, table = %self.table, record = ?record, "Candidate record"),
            }
        }

        self.sink.ensure_ready().await?;

        let outcomes = join_all(extraction.records.iter().map(|record| self.write_row(block_height, record))).await;

        report.attempted = outcomes.len();
        for (record, outcome) in extraction.records.into_iter().zip(outcomes) {
            match outcome {
                RowOutcome::Stored => report.stored += 1,
                RowOutcome::Failed(err) => report.failures.push((record, err)),
            }
        }

        tracing::info!(
            block_height,
            table = %self.table,
            stored = report.stored,
            failed = report.failures.len(),
            "Block pass settled"
        );
        Ok(report)
    }

    async fn write_row(&self, block_height: u64, record: &CandidateRecord) -> RowOutcome {
        match self.sink.insert(&self.table, record).await {
            Ok(()) => RowOutcome::Stored,
            Err(err) => {
                tracing::error!(block_height, table = %self.table, error = %err, "Error processing receipt");
                RowOutcome::Failed(err)
            }
        }
    }
}
