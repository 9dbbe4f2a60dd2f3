//! Interrupt-to-main-loop edge signalling.
//!
//! GPIO ISRs do nothing but set one bit per input in a shared mask; the
//! main loop drains the whole mask once per scan and runs all timing and
//! debounce logic on the snapshot.
//!
//! ```text
//! ┌─────────────┐  signal(i)  ┌──────────────┐  drain()  ┌──────────────┐
//! │ Keypad ISRs │────────────▶│  EdgeMask    │──────────▶│  Main Loop   │
//! │ (any edge)  │             │ (AtomicU32)  │           │  (consumer)  │
//! └─────────────┘             └──────────────┘           └──────────────┘
//! ```

use core::sync::atomic::{AtomicU32, Ordering};

/// Number of inputs a single mask can carry.
pub const MAX_EDGE_INPUTS: usize = 32;

/// Pending-edge bitmask shared between interrupt and main contexts.
pub struct EdgeMask {
    pending: AtomicU32,
}

/// Mask written by the keypad GPIO ISRs.
pub static KEYPAD_EDGES: EdgeMask = EdgeMask::new();

impl EdgeMask {
    pub const fn new() -> Self {
        Self {
            pending: AtomicU32::new(0),
        }
    }

    /// Mark an edge on input `index`.  Safe to call from ISR context.
    /// Indices past the mask width are dropped.
    pub fn signal(&self, index: usize) {
        if index >= MAX_EDGE_INPUTS {
            return;
        }
        self.pending.fetch_or(1u32 << index, Ordering::AcqRel);
    }

    /// Snapshot and clear every pending edge as one step.
    ///
    /// Runs with interrupts masked so no ISR can land between the read and
    /// the clear: an edge is reported by exactly one drain.
    pub fn drain(&self) -> u32 {
        critical_section::with(|_| self.pending.swap(0, Ordering::AcqRel))
    }

    /// Peek without clearing (diagnostics only).
    pub fn is_empty(&self) -> bool {
        self.pending.load(Ordering::Acquire) == 0
    }
}

impl Default for EdgeMask {
    fn default() -> Self {
        Self::new()
    }
}
