//! PostgreSQL Sink Adapter
//!
//! Implements `RowSink` on top of a sqlx connection pool. Every candidate
//! record becomes one `INSERT` executed on its own pooled connection, so rows
//! commit independently of each other.
//!
//! Table names come from indexer configuration and are validated as plain
//! identifiers by `TableName` before they reach this module; they are still
//! quoted because QueryAPI style schemas use mixed case (`"Indexers"`).

use crate::{
    application::{AppError, AppResult, RowSink},
    domain::{CandidateRecord, ColumnValue, TableName},
};
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};

pub struct PostgresSink {
    pool: PgPool,
}

impl PostgresSink {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }
}

/// `INSERT INTO "table" ("a", "b") VALUES ($1, $2)`
pub fn insert_statement(table: &TableName, columns: &[&str]) -> String {
    let names = columns.iter().map(|c| format!("\"{c}\"")).collect::<Vec<_>>().join(", ");
    let params = (1..=columns.len()).map(|i| format!("${i}")).collect::<Vec<_>>().join(", ");
    format!("INSERT INTO \"{}\" ({}) VALUES ({})", table.as_str(), names, params)
}

#[async_trait]
impl RowSink for PostgresSink {
    async fn ensure_ready(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::SinkUnavailable(e.to_string()))?;
        Ok(())
    }

    async fn insert(&self, table: &TableName, record: &CandidateRecord) -> AppResult<()> {
        let columns = record.columns().map_err(|e| AppError::Write {
            table: table.to_string(),
            reason: format!("block height {} out of range: {e}", record.block_height()),
        })?;
        let names = columns.iter().map(|(name, _)| *name).collect::<Vec<_>>();
        let sql = insert_statement(table, &names);

        let mut query = sqlx::query(&sql);
        for (_, value) in columns {
            query = match value {
                ColumnValue::Text(text) => query.bind(text),
                ColumnValue::BigInt(n) => query.bind(n),
            };
        }

        query
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Write { table: table.to_string(), reason: e.to_string() })?;

        tracing::debug!(table = %table, block_height = record.block_height(), "Inserted row");
        Ok(())
    }
}
