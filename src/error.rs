//! Unified error types for the irrigation firmware.
//!
//! One small enum per subsystem, each convertible into the top-level
//! [`Error`].  All variants are `Copy` so they can be logged and passed
//! around the control loop without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The settings store could not be read or written.
    Store(StoreError),
    /// A remote payload could not be decoded.
    Decode(DecodeError),
    /// A message could not be handed to the broker client.
    Publish,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Decode(e) => write!(f, "decode: {e}"),
            Self::Publish => write!(f, "publish failed"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Block device errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashError {
    /// The settings partition does not exist in the partition table.
    PartitionMissing,
    /// Erase of the settings block failed (driver return code).
    Erase(i32),
    /// Program of the settings block failed (driver return code).
    Program(i32),
    /// Read-back of the settings block failed (driver return code).
    Read(i32),
    /// Caller buffer does not match the block size.
    BadLength,
}

impl fmt::Display for FlashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PartitionMissing => write!(f, "settings partition missing"),
            Self::Erase(rc) => write!(f, "erase failed (rc={rc})"),
            Self::Program(rc) => write!(f, "program failed (rc={rc})"),
            Self::Read(rc) => write!(f, "read failed (rc={rc})"),
            Self::BadLength => write!(f, "buffer length does not match block size"),
        }
    }
}

// ---------------------------------------------------------------------------
// Settings store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// Encoded record does not fit in one erase block.
    RecordTooLarge { size: usize, block: usize },
    /// Block contents after programming differ from what was written.
    VerifyMismatch,
    /// The underlying block device failed.
    Flash(FlashError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RecordTooLarge { size, block } => {
                write!(f, "record of {size} bytes exceeds {block}-byte block")
            }
            Self::VerifyMismatch => write!(f, "post-write verification failed"),
            Self::Flash(e) => write!(f, "flash: {e}"),
        }
    }
}

impl core::error::Error for FlashError {}

impl core::error::Error for StoreError {}

impl From<FlashError> for StoreError {
    fn from(e: FlashError) -> Self {
        Self::Flash(e)
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Remote payload errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Payload is not valid JSON or misses required fields.
    Malformed,
    /// Message arrived on a topic this firmware does not handle.
    UnknownTopic,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed payload"),
            Self::UnknownTopic => write!(f, "unknown topic"),
        }
    }
}

impl core::error::Error for DecodeError {}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Self::Decode(e)
    }
}
