//! Persistent settings store: one magic-validated record in one erase block.
//!
//! ```text
//! offset  size  field
//! 0       4     magic (LE u32, STORAGE_MAGIC)
//! 4       2*N   threshold[N] (LE u16)
//! ..      ..    FLASH_FILL_BYTE up to the block size
//! ```
//!
//! Every [`SettingsStore::save`] rewrites the whole block: erase, program,
//! read back, compare.  A record whose magic does not match is replaced by
//! defaults, which are written before `load()` returns.

use log::{info, warn};

use crate::app::ports::BlockDevice;
use crate::config::{
    DEFAULT_MOISTURE_THRESHOLD, FLASH_FILL_BYTE, MAX_CHANNELS, MAX_SENSOR_VALUE, STORAGE_MAGIC,
};
use crate::error::StoreError;

/// Encoded size of [`SettingsRecord`].
pub const RECORD_SIZE: usize = 4 + 2 * MAX_CHANNELS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsRecord {
    pub magic: u32,
    pub threshold: [u16; MAX_CHANNELS],
}

impl SettingsRecord {
    pub fn defaults() -> Self {
        Self {
            magic: STORAGE_MAGIC,
            threshold: [DEFAULT_MOISTURE_THRESHOLD; MAX_CHANNELS],
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == STORAGE_MAGIC
    }

    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut out = [0u8; RECORD_SIZE];
        out[..4].copy_from_slice(&self.magic.to_le_bytes());
        for (i, t) in self.threshold.iter().enumerate() {
            out[4 + 2 * i..6 + 2 * i].copy_from_slice(&t.to_le_bytes());
        }
        out
    }

    /// Decode the leading [`RECORD_SIZE`] bytes.  Does not check the magic.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let bytes = bytes.get(..RECORD_SIZE)?;
        let magic = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let mut threshold = [0u16; MAX_CHANNELS];
        for (i, t) in threshold.iter_mut().enumerate() {
            *t = u16::from_le_bytes([bytes[4 + 2 * i], bytes[5 + 2 * i]]);
        }
        Some(Self { magic, threshold })
    }
}

impl Default for SettingsRecord {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Owner of the in-memory record and the block it lives in.
///
/// Not reentrant: callers serialize access (main loop only).
pub struct SettingsStore<B> {
    device: B,
    record: SettingsRecord,
}

impl<B: BlockDevice> SettingsStore<B> {
    /// Wrap `device`.  The record holds defaults until [`load`](Self::load).
    pub fn new(device: B) -> Self {
        Self {
            device,
            record: SettingsRecord::defaults(),
        }
    }

    /// Read the record.  On a magic mismatch, reset to defaults and persist
    /// them; the result then reports whether that write succeeded.
    pub fn load(&mut self) -> Result<(), StoreError> {
        let mut block = vec![0u8; self.device.block_size()];
        self.device.read(&mut block)?;

        match SettingsRecord::decode(&block).filter(SettingsRecord::is_valid) {
            Some(mut record) => {
                for t in record.threshold.iter_mut() {
                    *t = (*t).min(MAX_SENSOR_VALUE);
                }
                self.record = record;
                info!("store: loaded thresholds {:?}", self.record.threshold);
                Ok(())
            }
            None => {
                warn!("store: no valid record, writing defaults");
                self.record = SettingsRecord::defaults();
                self.save()
            }
        }
    }

    /// Erase, program and verify the whole block.
    pub fn save(&mut self) -> Result<(), StoreError> {
        let block_size = self.device.block_size();
        if RECORD_SIZE > block_size {
            return Err(StoreError::RecordTooLarge {
                size: RECORD_SIZE,
                block: block_size,
            });
        }

        let mut image = vec![FLASH_FILL_BYTE; block_size];
        image[..RECORD_SIZE].copy_from_slice(&self.record.encode());

        self.device.erase()?;
        self.device.program(&image)?;

        let mut readback = vec![0u8; block_size];
        self.device.read(&mut readback)?;
        if readback != image {
            warn!("store: verify mismatch after write");
            return Err(StoreError::VerifyMismatch);
        }
        info!("store: saved thresholds {:?}", self.record.threshold);
        Ok(())
    }

    pub fn record(&self) -> &SettingsRecord {
        &self.record
    }

    /// Update one slot in memory (clamped).  Out-of-range slots are ignored.
    pub fn set_threshold(&mut self, slot: usize, value: u16) {
        if let Some(t) = self.record.threshold.get_mut(slot) {
            *t = value.min(MAX_SENSOR_VALUE);
        }
    }

    pub fn device(&self) -> &B {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut B {
        &mut self.device
    }
}
