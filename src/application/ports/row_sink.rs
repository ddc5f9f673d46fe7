use crate::application::AppResult;
use crate::domain::{CandidateRecord, TableName};
use async_trait::async_trait;

#[async_trait]
pub trait RowSink: Send + Sync {
    /// Checked once per block pass before any insert is dispatched.
    /// An error here fails the pass.
    async fn ensure_ready(&self) -> AppResult<()>;

    /// Store a single row. Each call commits or fails on its own.
    async fn insert(&self, table: &TableName, record: &CandidateRecord) -> AppResult<()>;
}
