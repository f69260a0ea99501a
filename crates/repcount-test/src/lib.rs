//! Repcount Test Harness - Synthetic motion and detector chaos
//!
//! This crate provides:
//! - Keypoint frames with an exact metric value
//! - Scripted repetition sweeps for any profile
//! - A seeded chaos detector (noise, drops, dropouts, low confidence)
//! - End-to-end counting scenarios

pub mod motion;
pub mod chaos;
pub mod integration;

pub use motion::*;
pub use chaos::*;
pub use integration::*;
