//! Flash block adapter.
//!
//! Implements [`BlockDevice`] over the first erase block of the data
//! partition labelled `settings`.
//!
//! - **`target_os = "espidf"`** — `esp_partition_*` calls on the real
//!   partition.
//! - **`not(target_os = "espidf")`** — an in-memory block that behaves
//!   like NOR flash: erase sets every byte to `0xFF`, programming can
//!   only clear bits.

use crate::app::ports::BlockDevice;
use crate::config::ERASE_BLOCK_SIZE;
use crate::error::FlashError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
const PARTITION_LABEL: &core::ffi::CStr = c"settings";

pub struct FlashPartition {
    #[cfg(target_os = "espidf")]
    partition: *const esp_partition_t,
    #[cfg(not(target_os = "espidf"))]
    block: Vec<u8>,
}

#[cfg(target_os = "espidf")]
impl FlashPartition {
    /// Look up the `settings` partition.
    pub fn new() -> Result<Self, FlashError> {
        // SAFETY: the partition table is static after boot; the returned
        // pointer stays valid for the program's lifetime.
        let partition = unsafe {
            esp_partition_find_first(
                esp_partition_type_t_ESP_PARTITION_TYPE_DATA,
                esp_partition_subtype_t_ESP_PARTITION_SUBTYPE_ANY,
                PARTITION_LABEL.as_ptr(),
            )
        };
        if partition.is_null() {
            return Err(FlashError::PartitionMissing);
        }
        // SAFETY: non-null pointer into the static partition table.
        if (unsafe { (*partition).size } as usize) < ERASE_BLOCK_SIZE {
            return Err(FlashError::PartitionMissing);
        }
        log::info!("flash: settings partition found");
        Ok(Self { partition })
    }
}

#[cfg(target_os = "espidf")]
impl BlockDevice for FlashPartition {
    fn block_size(&self) -> usize {
        ERASE_BLOCK_SIZE
    }

    fn erase(&mut self) -> Result<(), FlashError> {
        // SAFETY: offset 0 and one block are inside the partition (checked in new()).
        let ret = unsafe { esp_partition_erase_range(self.partition, 0, ERASE_BLOCK_SIZE) };
        if ret != ESP_OK as i32 {
            return Err(FlashError::Erase(ret));
        }
        Ok(())
    }

    fn program(&mut self, data: &[u8]) -> Result<(), FlashError> {
        if data.len() != ERASE_BLOCK_SIZE {
            return Err(FlashError::BadLength);
        }
        // SAFETY: `data` is a valid buffer of exactly one block.
        let ret = unsafe {
            esp_partition_write(self.partition, 0, data.as_ptr().cast(), data.len())
        };
        if ret != ESP_OK as i32 {
            return Err(FlashError::Program(ret));
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<(), FlashError> {
        if buf.len() != ERASE_BLOCK_SIZE {
            return Err(FlashError::BadLength);
        }
        // SAFETY: `buf` is a valid writable buffer of exactly one block.
        let ret = unsafe {
            esp_partition_read(self.partition, 0, buf.as_mut_ptr().cast(), buf.len())
        };
        if ret != ESP_OK as i32 {
            return Err(FlashError::Read(ret));
        }
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
impl FlashPartition {
    /// A fully erased block.
    pub fn new() -> Self {
        Self {
            block: vec![crate::config::FLASH_FILL_BYTE; ERASE_BLOCK_SIZE],
        }
    }

    /// A block preloaded with `image` (truncated or `0xFF`-padded).
    pub fn from_image(image: &[u8]) -> Self {
        let mut flash = Self::new();
        let n = image.len().min(ERASE_BLOCK_SIZE);
        flash.block[..n].copy_from_slice(&image[..n]);
        flash
    }

    pub fn image(&self) -> &[u8] {
        &self.block
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for FlashPartition {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
impl BlockDevice for FlashPartition {
    fn block_size(&self) -> usize {
        ERASE_BLOCK_SIZE
    }

    fn erase(&mut self) -> Result<(), FlashError> {
        self.block.fill(crate::config::FLASH_FILL_BYTE);
        Ok(())
    }

    fn program(&mut self, data: &[u8]) -> Result<(), FlashError> {
        if data.len() != self.block.len() {
            return Err(FlashError::BadLength);
        }
        for (cell, &byte) in self.block.iter_mut().zip(data) {
            *cell &= byte;
        }
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<(), FlashError> {
        if buf.len() != self.block.len() {
            return Err(FlashError::BadLength);
        }
        buf.copy_from_slice(&self.block);
        Ok(())
    }
}
