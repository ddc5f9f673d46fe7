use std::sync::Arc;
use anyhow::Context;
use tokio::sync::Mutex;
use near_indexer_functions::{
    adapters::{FileSourceAdaptor, MemorySink, PostgresSink, extractors::{FunctionCallExtractor, Nep141Extractor}},
    application::{BlockExtractor, BlockProcessor, Indexer, IngestionPipeline, RowSink},
    infrastructure::{ExtractorKind, IndexerConfig, SinkConfig, init_tracing},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {

    dotenv::dotenv().ok();

    init_tracing();

    let config = IndexerConfig::from_env().context("Failed to load indexer configuration")?;

    tracing::info!(table = %config.table, extractor = ?config.extractor, "Initializing NEAR indexer function");

    // Dependency Injection - Source
    let source = Arc::new(Mutex::new(
        FileSourceAdaptor::open(&config.blocks_file)
            .await
            .context("Failed to open block source")?,
    ));

    // Dependency Injection - Sink
    let sink: Arc<dyn RowSink> = match &config.sink {
        SinkConfig::Memory => Arc::new(MemorySink::new()),
        SinkConfig::Postgres { database_url, max_connections } => Arc::new(
            PostgresSink::new(database_url, *max_connections)
                .await
                .context("Failed to connect to Postgres")?,
        ),
    };

    // Dependency Injection - Extractor
    let extractor: Arc<dyn BlockExtractor> = match &config.extractor {
        ExtractorKind::FunctionCall { target_contract } => Arc::new(FunctionCallExtractor::new(target_contract.clone())),
        ExtractorKind::Nep141 => Arc::new(Nep141Extractor::new()),
    };

    let processor = BlockProcessor::new(extractor, sink, config.table.clone());
    let pipeline = IngestionPipeline::new(source, vec![Indexer::new(config.rule.clone(), processor)]);

    tracing::info!("Starting Ingestion Pipeline...");
    let summary = pipeline.run().await.context("Ingestion pipeline failed")?;

    tracing::info!(
        blocks = summary.blocks,
        rows_stored = summary.rows_stored,
        row_failures = summary.row_failures,
        "Done"
    );

    Ok(())

}
