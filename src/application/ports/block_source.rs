use async_trait::async_trait;
use crate::{application::AppResult, domain::Block};

#[async_trait]
pub trait BlockSource: Send + Sync {
    /// Next block in height order, or `None` once the stream is exhausted.
    async fn next_block(&mut self) -> AppResult<Option<Block>>;
}
