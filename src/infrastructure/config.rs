use std::path::PathBuf;

use crate::{
    application::{AppError, AppResult},
    domain::{IndexerRule, TableName, DEFAULT_QUERY_API_CONTRACT},
};

#[derive(Debug, Clone, PartialEq)]
pub enum ExtractorKind {
    FunctionCall { target_contract: String },
    Nep141,
}

impl ExtractorKind {
    fn default_table(&self) -> &'static str {
        match self {
            ExtractorKind::FunctionCall { .. } => "Indexers",
            ExtractorKind::Nep141 => "UsdtTransactions",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkConfig {
    Memory,
    Postgres { database_url: String, max_connections: u32 },
}

#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub blocks_file: PathBuf,
    pub sink: SinkConfig,
    pub extractor: ExtractorKind,
    pub table: TableName,
    pub rule: Option<IndexerRule>,
}

impl IndexerConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let blocks_file = lookup("BLOCKS_FILE")
            .map(PathBuf::from)
            .ok_or_else(|| AppError::Config("BLOCKS_FILE is not provided".to_string()))?;

        let sink = match lookup("SINK_TYPE").unwrap_or_else(|| "memory".to_string()).to_lowercase().as_str() {
            "memory" => SinkConfig::Memory,
            "postgres" => {
                let database_url = lookup("DATABASE_URL")
                    .ok_or_else(|| AppError::Config("DATABASE_URL is required for the postgres sink".to_string()))?;
                let max_connections = match lookup("DB_MAX_CONNECTIONS") {
                    Some(raw) => raw
                        .parse()
                        .map_err(|_| AppError::Config(format!("Invalid DB_MAX_CONNECTIONS: {}", raw)))?,
                    None => 10,
                };
                SinkConfig::Postgres { database_url, max_connections }
            }
            other => return Err(AppError::Config(format!("Invalid SINK_TYPE: {}", other))),
        };

        let extractor = match lookup("INDEXER_KIND").unwrap_or_else(|| "function_call".to_string()).to_lowercase().as_str() {
            "function_call" => ExtractorKind::FunctionCall {
                target_contract: lookup("TARGET_CONTRACT").unwrap_or_else(|| DEFAULT_QUERY_API_CONTRACT.to_string()),
            },
            "nep141" => ExtractorKind::Nep141,
            other => return Err(AppError::Config(format!("Invalid INDEXER_KIND: {}", other))),
        };

        let table_name = lookup("TABLE_NAME").unwrap_or_else(|| extractor.default_table().to_string());
        let table = TableName::new(table_name).map_err(AppError::InvalidTableName)?;

        let rule = lookup("FILTER_JSON")
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| IndexerRule::from_json(&raw))
            .transpose()?;

        Ok(Self { blocks_file, sink, extractor, table, rule })
    }
}
