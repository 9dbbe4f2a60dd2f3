//! Irrigation controller firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod pins;
pub mod roster;
pub mod store;

// Hardware-facing modules; on host builds they fall back to the
// simulation stubs inside each file.
pub mod adapters;
pub mod control;
pub mod drivers;

#[cfg(target_os = "espidf")]
mod esp_link_shims;
