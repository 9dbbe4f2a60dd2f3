//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the business rules for the irrigation controller:
//! keypad gestures, threshold editing, remote roster reconciliation and
//! the periodic control pass.  All interaction with hardware happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
pub mod ui;
