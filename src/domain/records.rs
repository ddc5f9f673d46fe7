use std::num::TryFromIntError;

use serde::Serialize;

use crate::domain::EventKind;

/// A sink-ready row derived from one action or one event data item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CandidateRecord {
    FunctionCall(FunctionCallRecord),
    TokenTransfer(TokenTransferRecord),
}

/// Row of the `Indexers` table, whose columns are lowercase apart from `block_height`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCallRecord {
    pub account_id: String,
    pub function_name: String,
    pub method_name: String,
    pub signer_id: String,
    #[serde(rename = "block_height")]
    pub block_height: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenTransferRecord {
    pub event: EventKind,
    pub amount: String,
    pub from_account: Option<String>,
    pub to_account: Option<String>,
    pub block_height: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnValue {
    Text(Option<String>),
    BigInt(i64),
}

impl CandidateRecord {
    pub fn block_height(&self) -> u64 {
        match self {
            CandidateRecord::FunctionCall(r) => r.block_height,
            CandidateRecord::TokenTransfer(r) => r.block_height,
        }
    }

    /// Column/value pairs in insert order. Fails when the block height does
    /// not fit a signed 64-bit column.
    pub fn columns(&self) -> Result<Vec<(&'static str, ColumnValue)>, TryFromIntError> {
        let block_height = ColumnValue::BigInt(i64::try_from(self.block_height())?);

        Ok(match self {
            CandidateRecord::FunctionCall(r) => vec![
                ("functionname", ColumnValue::Text(Some(r.function_name.clone()))),
                ("accountid", ColumnValue::Text(Some(r.account_id.clone()))),
                ("signerid", ColumnValue::Text(Some(r.signer_id.clone()))),
                ("methodname", ColumnValue::Text(Some(r.method_name.clone()))),
                ("block_height", block_height),
            ],
            CandidateRecord::TokenTransfer(r) => vec![
                ("event", ColumnValue::Text(Some(r.event.to_string()))),
                ("amount", ColumnValue::Text(Some(r.amount.clone()))),
                ("from_account", ColumnValue::Text(r.from_account.clone())),
                ("to_account", ColumnValue::Text(r.to_account.clone())),
                ("block_height", block_height),
            ],
        })
    }
}

impl From<FunctionCallRecord> for CandidateRecord {
    fn from(value: FunctionCallRecord) -> Self {
        CandidateRecord::FunctionCall(value)
    }
}

impl From<TokenTransferRecord> for CandidateRecord {
    fn from(value: TokenTransferRecord) -> Self {
        CandidateRecord::TokenTransfer(value)
    }
}

/// Postgres limits identifiers to 63 bytes.
const MAX_TABLE_NAME_LEN: usize = 63;

/// A validated target table identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        let mut chars = name.chars();
        let starts_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

        if starts_ok && rest_ok && name.len() <= MAX_TABLE_NAME_LEN {
            Ok(Self(name))
        } else {
            Err(name)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
