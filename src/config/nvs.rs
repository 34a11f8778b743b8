//! NVS persistence for the byte-addressed memory image.
//!
//! The firmware layout (header + 12 memory chunks, see [`crate::memory`]) is
//! byte-exact with devices that stored it in a 512-byte EEPROM. On ESP32 the
//! whole image lives in RAM and is persisted as one NVS blob.
//!
//! # Version History
//!
//! - **v1** (current): single `eeprom` blob of [`IMAGE_SIZE`] bytes

use core::cmp::Ordering;

use crate::memory::{ERASED, IMAGE_SIZE};

#[cfg(target_os = "espidf")]
use esp_idf_svc::nvs::*;
#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::EspError;

/// Current NVS schema version for the image blob
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// NVS namespace for the bluebox image
pub const NVS_NAMESPACE: &str = "bluebox";

/// NVS key for schema version
#[cfg(target_os = "espidf")]
const VERSION_KEY: &str = "schema_ver";

/// NVS key for the image blob
#[cfg(target_os = "espidf")]
const IMAGE_KEY: &str = "eeprom";

/// Load result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationResult {
    /// No blob yet, image reads as erased
    FreshInstall,
    /// Schema up-to-date, loaded successfully
    UpToDate,
}

/// NVS operation errors
#[derive(Debug)]
pub enum NvsError {
    /// NVS initialization failed
    #[cfg(target_os = "espidf")]
    InitFailed(EspError),
    /// Schema version too new (downgrade not supported)
    TooNew { stored_version: u32 },
    /// NVS read/write error
    #[cfg(target_os = "espidf")]
    IoError(EspError),
    /// Access past the end of the image
    OutOfRange { addr: usize, len: usize },
    /// Feature not available on this platform
    #[cfg(not(target_os = "espidf"))]
    NotAvailable,
}

#[cfg(target_os = "espidf")]
impl From<EspError> for NvsError {
    fn from(e: EspError) -> Self {
        NvsError::IoError(e)
    }
}

/// RAM copy of the persistent image.
///
/// Starts fully erased (`0xFF`), like a blank EEPROM.
pub struct ImageMirror {
    bytes: [u8; IMAGE_SIZE],
}

impl ImageMirror {
    pub const fn erased() -> Self {
        Self {
            bytes: [ERASED; IMAGE_SIZE],
        }
    }

    /// Replace the whole image (e.g. from a loaded blob).
    ///
    /// Shorter sources leave the tail erased.
    pub fn load(&mut self, src: &[u8]) {
        let n = src.len().min(IMAGE_SIZE);
        self.bytes = [ERASED; IMAGE_SIZE];
        self.bytes[..n].copy_from_slice(&src[..n]);
    }

    pub fn read(&self, addr: usize, buf: &mut [u8]) -> Result<(), NvsError> {
        let range = Self::range(addr, buf.len())?;
        buf.copy_from_slice(&self.bytes[range]);
        Ok(())
    }

    /// Write `data` at `addr`. Returns `true` if any byte changed.
    pub fn write(&mut self, addr: usize, data: &[u8]) -> Result<bool, NvsError> {
        let range = Self::range(addr, data.len())?;
        let changed = self.bytes[range.clone()] != *data;
        self.bytes[range].copy_from_slice(data);
        Ok(changed)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn range(addr: usize, len: usize) -> Result<core::ops::Range<usize>, NvsError> {
        match addr.checked_add(len) {
            Some(end) if end <= IMAGE_SIZE => Ok(addr..end),
            _ => Err(NvsError::OutOfRange { addr, len }),
        }
    }
}

impl Default for ImageMirror {
    fn default() -> Self {
        Self::erased()
    }
}

/// Decide how to treat a stored schema version.
pub fn check_schema(stored_version: u32) -> Result<MigrationResult, NvsError> {
    match stored_version.cmp(&CURRENT_SCHEMA_VERSION) {
        Ordering::Equal => Ok(MigrationResult::UpToDate),
        // v0 means nothing was ever written
        Ordering::Less => Ok(MigrationResult::FreshInstall),
        Ordering::Greater => Err(NvsError::TooNew { stored_version }),
    }
}

/// NVS-backed image store (ESP32).
#[cfg(target_os = "espidf")]
pub struct NvsImage {
    storage: EspNvs<NvsDefault>,
    mirror: ImageMirror,
}

#[cfg(target_os = "espidf")]
impl NvsImage {
    /// Open the namespace and pull the image into RAM.
    pub fn open(partition: EspDefaultNvsPartition) -> Result<(Self, MigrationResult), NvsError> {
        let storage = EspNvs::new(partition, NVS_NAMESPACE, true)
            .map_err(NvsError::InitFailed)?;

        let stored_version = storage.get_u32(VERSION_KEY)?.unwrap_or(0);
        let result = check_schema(stored_version)?;

        let mut mirror = ImageMirror::erased();
        if result == MigrationResult::UpToDate {
            let mut blob = [ERASED; IMAGE_SIZE];
            if let Some(data) = storage.get_blob(IMAGE_KEY, &mut blob)? {
                mirror.load(data);
            }
        }

        Ok((Self { storage, mirror }, result))
    }

    pub fn read(&self, addr: usize, buf: &mut [u8]) -> Result<(), NvsError> {
        self.mirror.read(addr, buf)
    }

    /// Update the image and commit the blob. Blocks until NVS has it.
    pub fn write(&mut self, addr: usize, data: &[u8]) -> Result<(), NvsError> {
        if self.mirror.write(addr, data)? {
            self.storage.set_blob(IMAGE_KEY, self.mirror.as_bytes())?;
            self.storage.set_u32(VERSION_KEY, CURRENT_SCHEMA_VERSION)?;
        }
        Ok(())
    }
}
