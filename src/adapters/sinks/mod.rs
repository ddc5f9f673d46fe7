pub mod memory_sink;
pub mod postgres_sink;

pub use memory_sink::*;
pub use postgres_sink::*;
