//! Repcount Core - Fundamental types and primitives
//!
//! This crate defines the types shared by every counting component:
//! - Client identity (ClientId)
//! - Caller-supplied frame time (FrameTime)
//! - Joints, keypoints and keypoint index layouts
//! - The error taxonomy surfaced to callers

pub mod id;
pub mod time;
pub mod joint;
pub mod error;

pub use id::*;
pub use time::*;
pub use joint::*;
pub use error::*;
