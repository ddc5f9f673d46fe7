use crate::{
    application::ExtractError,
    domain::{Block, CandidateRecord},
};

/// Outcome of one extraction pass over a block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub records: Vec<CandidateRecord>,
    /// Items dropped because they could not be decoded.
    pub skipped: Vec<ExtractError>,
}

/// Pure, synchronous selection of candidate records from a block.
pub trait BlockExtractor: Send + Sync {
    fn extract(&self, block: &Block) -> Extraction;
    fn name(&self) -> &str;
}
