//! Repcount Signal - Measurements from joint keypoints
//!
//! Raw per-frame joint positions are noisy. This crate turns them into a
//! scalar per frame (joint angle or limb spread) and denoises that scalar
//! with a short moving average.

pub mod geometry;
pub mod smooth;

pub use geometry::*;
pub use smooth::*;
