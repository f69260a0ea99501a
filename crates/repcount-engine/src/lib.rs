//! Repcount Engine - Exercise profiles and the repetition state machine
//!
//! A profile says what to measure and where the two reference positions
//! lie. A [`RepSession`] feeds smoothed measurements through a
//! three-stage machine and counts a repetition each time the limb goes
//! from extended to flexed outside the profile's cooldown.

pub mod metric;
pub mod profile;
pub mod machine;

pub use metric::*;
pub use profile::*;
pub use machine::*;
