//! Repcount Session - Concurrent per-client counting sessions
//!
//! Each client gets an isolated [`RepSession`](repcount_engine::RepSession)
//! behind its own lock. Frames for different clients never contend; frames
//! for the same client are applied in the order they are delivered.

pub mod config;
pub mod manager;

pub use config::*;
pub use manager::*;
