//! Observability module providing structured logging.
//!
//! - Decision records (`LAMBDA_EVENT`, `<ACTION>_KWARGS`, `AWS_RESPONSE`,
//!   `EXCEPTION`) emitted through `tracing`
//! - Subscriber initialization with configurable format (pretty, compact, JSON),
//!   requires the `cli` feature. The JSON format nests record values as objects.

#[cfg(feature = "cli")]
mod json_records;
mod records;
#[cfg(feature = "cli")]
mod tracing_init;

#[cfg(feature = "cli")]
pub use json_records::{JsonRecordConfig, JsonRecordLayer};
pub use records::*;
#[cfg(feature = "cli")]
pub use tracing_init::*;
