//! Keypad and pump drivers, plus one-shot hardware initialisation.

pub mod hw_init;
pub mod keypad;
pub mod pump;
