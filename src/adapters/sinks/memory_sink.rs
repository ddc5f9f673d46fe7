//! In-process sink used for dry runs and tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    application::{AppError, AppResult, RowSink},
    domain::{CandidateRecord, TableName},
};

type FailurePredicate = Box<dyn Fn(&CandidateRecord) -> bool + Send + Sync>;

#[derive(Default)]
pub struct MemorySink {
    rows: Mutex<Vec<(TableName, CandidateRecord)>>,
    fail_when: Option<FailurePredicate>,
    unavailable: bool,
    latency: Option<Duration>,
    attempts: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every insert whose record matches `predicate`.
    pub fn failing_when(mut self, predicate: impl Fn(&CandidateRecord) -> bool + Send + Sync + 'static) -> Self {
        self.fail_when = Some(Box::new(predicate));
        self
    }

    /// Fail the readiness check, as an unreachable database would.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub async fn rows(&self) -> Vec<(TableName, CandidateRecord)> {
        self.rows.lock().await.clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Highest number of inserts observed running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RowSink for MemorySink {
    async fn ensure_ready(&self) -> AppResult<()> {
        if self.unavailable {
            return Err(AppError::SinkUnavailable("memory sink marked unavailable".to_string()));
        }
        Ok(())
    }

    async fn insert(&self, table: &TableName, record: &CandidateRecord) -> AppResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let result = match &self.fail_when {
            _ if record.columns().is_err() => Err(AppError::Write {
                table: table.to_string(),
                reason: format!("block height {} out of range", record.block_height()),
            }),
            Some(predicate) if predicate(record) => Err(AppError::Write {
                table: table.to_string(),
                reason: "rejected by memory sink".to_string(),
            }),
            _ => {
                self.rows.lock().await.push((table.clone(), record.clone()));
                tracing::debug!(table = %table, block_height = record.block_height(), "Stored row in memory");
                Ok(())
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
