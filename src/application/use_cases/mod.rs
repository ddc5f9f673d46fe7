pub mod ingest;
pub mod process_block;

pub use ingest::*;
pub use process_block::*;
