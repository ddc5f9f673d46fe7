pub mod extractors;
pub mod inbound;
pub mod sinks;

pub use inbound::*;
pub use sinks::*;
