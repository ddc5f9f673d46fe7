pub mod function_call;
pub mod nep141;

pub use function_call::*;
pub use nep141::*;
