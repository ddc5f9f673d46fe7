pub mod models;
pub mod records;
pub mod rule;

pub use models::*;
pub use records::*;
pub use rule::*;
