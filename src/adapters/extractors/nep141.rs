use serde_json::Value;

use crate::{
    application::{BlockExtractor, ExtractError, Extraction},
    domain::{Block, CandidateRecord, Event, EventData, EventKind, ItemKind, StandardEvent, TokenTransferRecord},
};

/// Turns NEP-141 fungible token events into one transfer record per data item.
pub struct Nep141Extractor;

impl Nep141Extractor {
    pub fn new() -> Self {
        Self
    }

    fn extract_event(index: usize, event: &Event, payload: &str, block_height: u64) -> Result<Vec<CandidateRecord>, ExtractError> {
        let location = match &event.related_receipt_id {
            Some(receipt) => format!("event {index} (receipt {receipt})"),
            None => format!("event {index}"),
        };

        let value: Value = serde_json::from_str(payload).map_err(|e| ExtractError::Decode {
            location: location.clone(),
            reason: e.to_string(),
        })?;
        let standard: StandardEvent = serde_json::from_value(value).map_err(|e| ExtractError::FieldShape {
            location,
            reason: e.to_string(),
        })?;

        Ok(standard
            .data
            .iter()
            .map(|data| CandidateRecord::TokenTransfer(transfer_record(&standard.event, data, block_height)))
            .collect())
    }
}

impl Default for Nep141Extractor {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockExtractor for Nep141Extractor {
    fn name(&self) -> &str {
        "Nep141Extractor"
    }

    fn extract(&self, block: &Block) -> Extraction {
        let mut extraction = Extraction::default();

        for item in block.malformed().iter().filter(|item| item.kind == ItemKind::Event) {
            let err = ExtractError::FieldShape { location: item.location(), reason: item.reason.clone() };
            tracing::warn!(block_height = block.height(), error = %err, "Skipping event");
            extraction.skipped.push(err);
        }

        for (index, event) in block.events().iter().enumerate() {
            let Some(payload) = event.raw_event.standard.as_deref().filter(|s| !s.is_empty()) else {
                continue;
            };

            match Self::extract_event(index, event, payload, block.height()) {
                Ok(records) => extraction.records.extend(records),
                Err(err) => {
                    tracing::warn!(block_height = block.height(), error = %err, "Skipping event");
                    extraction.skipped.push(err);
                }
            }
        }

        extraction
    }
}

/// Explicit owner fields win; otherwise mint implies the receiver and burn
/// implies the sender; anything else stays null. Empty ids count as absent.
pub fn transfer_record(event: &EventKind, data: &EventData, block_height: u64) -> TokenTransferRecord {
    let present = |id: &Option<String>| id.clone().filter(|s| !s.is_empty());

    let from_account = present(&data.old_owner_id).or_else(|| match event {
        EventKind::FtBurn => present(&data.owner_id),
        _ => None,
    });
    let to_account = present(&data.new_owner_id).or_else(|| match event {
        EventKind::FtMint => present(&data.owner_id),
        _ => None,
    });

    TokenTransferRecord {
        event: event.clone(),
        amount: data.amount.clone(),
        from_account,
        to_account,
        block_height,
    }
}
