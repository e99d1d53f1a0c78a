//! Sales-line extraction, classification and aggregation.

pub mod aggregate;
pub mod classify;
mod literal;
pub mod numbers;
pub mod patterns;
pub mod prompt;
pub mod response;

pub use aggregate::{aggregate, Aggregator};
pub use classify::{classify, CategoryClassifier, MerchandisingGrouping};
pub use numbers::{format_decimal, parse_decimal, parse_quantity};
pub use prompt::{build_request, Instruction};
pub use response::{parse_response, strip_wrappers};
