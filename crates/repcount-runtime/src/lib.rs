//! Repcount Runtime - Trace replay and process setup
//!
//! This crate drives the counting core from recorded traces:
//! 1. Parse JSON-lines trace events
//! 2. Route each event to its client's ordered worker
//! 3. Apply it to the shared session manager
//! 4. Emit one result record per applied event

pub mod observability;
pub mod replay;
pub mod trace;

pub use observability::{init, LogFormat, LoggingConfig};
pub use replay::*;
pub use trace::*;
