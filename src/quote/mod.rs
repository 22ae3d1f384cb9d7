//! Quote engine module for IronQuote.
//!
//! The pricing math is a set of pure functions over the flat records in
//! [`models`]; everything derived is recomputed from scratch on each call.

pub mod calculators;
pub mod models;
pub mod requests;
pub mod routes;

// Re-export commonly used items
pub use calculators::{compute_quote, format_money, round_money};
pub use models::{QuoteCalculationResult, QuoteSnapshot};
pub use requests::QuoteInputs;
pub use routes::router;
