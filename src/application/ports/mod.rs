pub mod block_source;
pub mod extractor;
pub mod row_sink;
pub use block_source::*;
pub use extractor::*;
pub use row_sink::*;
