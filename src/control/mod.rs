//! Control algorithms
//!
//! Per-channel threshold actuation for the pump outputs.

pub mod threshold;
