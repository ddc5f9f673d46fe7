use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio_stream::{StreamExt, wrappers::ReceiverStream};
use crate::{
    application::{AppResult, BlockProcessor, BlockSource},
    domain::{Block, IndexerRule}
};

/// One registered indexer function: an optional matching rule in front of
/// a block processor.
pub struct Indexer {
    pub rule: Option<IndexerRule>,
    pub processor: BlockProcessor,
}

impl Indexer {
    pub fn new(rule: Option<IndexerRule>, processor: BlockProcessor) -> Self {
        Self { rule, processor }
    }

    fn wants(&self, block: &Block) -> bool {
        self.rule.as_ref().map_or(true, |rule| rule.matches(block))
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PipelineSummary {
    pub blocks: u64,
    pub passes: u64,
    pub rows_stored: u64,
    pub row_failures: u64,
    pub items_skipped: u64,
}

pub struct IngestionPipeline {
    source: Arc<Mutex<dyn BlockSource>>,
    indexers: Vec<Indexer>,
}

impl IngestionPipeline {
    pub fn new(
        source: Arc<Mutex<dyn BlockSource>>,
        indexers: Vec<Indexer>
    ) -> Self {
        Self { source, indexers }
    }

    /// Streams blocks from the source and hands each one to every indexer,
    /// one block at a time. Stops at the end of the source or at the first
    /// fatal error.
    pub async fn run(&self) -> AppResult<PipelineSummary> {
        let (tx, rx) = mpsc::channel::<AppResult<Block>>(1000);

        // Producer loop
        let source = self.source.clone();
        let producer = tokio::spawn(async move {
            loop {
                let next = source.lock().await.next_block().await;

                let item = match next {
                    Ok(Some(block)) => Ok(block),
                    Ok(None) => {
                        tracing::info!("Source reached end of stream.");
                        break;
                    }
                    Err(err) => Err(err),
                };
                let is_err = item.is_err();

                if tx.send(item).await.is_err() || is_err {
                    break;
                }
            }
        });

        // Consumer loop
        let mut summary = PipelineSummary::default();
        let mut blocks = ReceiverStream::new(rx);
        let result = loop {
            let block = match blocks.next().await {
                Some(Ok(block)) => block,
                Some(Err(err)) => break Err(err),
                None => break Ok(()),
            };

            if let Err(err) = self.process_block(&block, &mut summary).await {
                break Err(err);
            }
        };

        drop(blocks);
        if result.is_err() {
            producer.abort();
        }
        let _ = producer.await;

        match result {
            Ok(()) => {
                tracing::info!(?summary, "Ingestion finished");
                Ok(summary)
            }
            Err(err) => {
                tracing::error!(error = %err, blocks = summary.blocks, "Ingestion stopped");
                Err(err)
            }
        }
    }

    async fn process_block(&self, block: &Block, summary: &mut PipelineSummary) -> AppResult<()> {
        summary.blocks += 1;
        tracing::debug!(block_height = block.height(), "Consumer received block");

        for indexer in &self.indexers {
            if !indexer.wants(block) {
                tracing::debug!(block_height = block.height(), indexer = indexer.processor.name(), "Block does not match rule");
                continue;
            }

            let report = indexer.processor.process(block).await?;
            summary.passes += 1;
            summary.rows_stored += report.stored as u64;
            summary.row_failures += report.failures.len() as u64;
            summary.items_skipped += report.skipped.len() as u64;
        }

        Ok(())
    }
}
