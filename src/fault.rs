//! Fault state and error types for RustBluebox.
//!
//! Nothing here stops the box. Every condition is resolved where it is
//! detected (fallback value or error chirp); `FaultState` only remembers
//! the last one for diagnostics.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

/// Error raised by the persistence and playback paths.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// E01: Persistent storage read or write failed
    Storage,
    /// E02: Header startup mode byte out of range
    InvalidMode(u8),
    /// E03: Header tone length byte neither fast nor slow
    InvalidToneLength(u8),
    /// E04: Memory slot never written (mode byte erased)
    EmptySlot,
    /// E05: Memory slot mode byte out of range
    CorruptSlot(u8),
    /// E06: Key has no memory slot
    NotAMemoryKey,
}

impl Error {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::Storage => "E01",
            Self::InvalidMode(_) => "E02",
            Self::InvalidToneLength(_) => "E03",
            Self::EmptySlot => "E04",
            Self::CorruptSlot(_) => "E05",
            Self::NotAMemoryKey => "E06",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::Storage => "storage error",
            Self::InvalidMode(_) => "invalid startup mode",
            Self::InvalidToneLength(_) => "invalid tone length",
            Self::EmptySlot => "empty memory",
            Self::CorruptSlot(_) => "corrupt memory",
            Self::NotAMemoryKey => "no memory for key",
        }
    }

    /// Fault code recorded for this error.
    pub fn fault_code(&self) -> FaultCode {
        match self {
            Self::Storage => FaultCode::Storage,
            Self::InvalidMode(_) => FaultCode::HeaderMode,
            Self::InvalidToneLength(_) => FaultCode::HeaderLength,
            Self::EmptySlot | Self::NotAMemoryKey => FaultCode::None,
            Self::CorruptSlot(_) => FaultCode::CorruptSlot,
        }
    }

    /// Offending byte, if any.
    pub fn data(&self) -> u32 {
        match *self {
            Self::InvalidMode(b) | Self::InvalidToneLength(b) | Self::CorruptSlot(b) => b as u32,
            _ => 0,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidMode(b) | Self::InvalidToneLength(b) | Self::CorruptSlot(b) => {
                write!(f, "{}: {} (0x{:02X})", self.code(), self.message(), b)
            }
            _ => write!(f, "{}: {}", self.code(), self.message()),
        }
    }
}

/// Fault codes for recorded anomalies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FaultCode {
    /// No fault (normal operation).
    None = 0,

    /// Header startup mode invalid, default mode in use.
    HeaderMode = 1,

    /// Header tone length invalid, fast length in use.
    HeaderLength = 2,

    /// A memory slot holds an out-of-range mode byte.
    CorruptSlot = 3,

    /// Persistent storage failed.
    Storage = 4,
}

impl FaultCode {
    /// Convert from raw u8 value.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => FaultCode::HeaderMode,
            2 => FaultCode::HeaderLength,
            3 => FaultCode::CorruptSlot,
            4 => FaultCode::Storage,
            _ => FaultCode::None,
        }
    }
}

/// Thread-safe fault record.
///
/// # Usage
///
/// ```ignore
/// static FAULT: FaultState = FaultState::new();
///
/// if let Err(e) = memory::write_header(board, header) {
///     FAULT.record(&e);
/// }
/// ```
pub struct FaultState {
    /// True if a fault was recorded and not cleared.
    active: AtomicBool,

    /// Fault code (reason for fault).
    code: AtomicU8,

    /// Additional data (offending byte).
    data: AtomicU32,

    /// Total fault count since boot (never cleared).
    count: AtomicU32,
}

impl FaultState {
    /// Create new fault state (no fault).
    pub const fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            code: AtomicU8::new(0),
            data: AtomicU32::new(0),
            count: AtomicU32::new(0),
        }
    }

    /// Set fault state and bump the counter.
    #[inline]
    pub fn set(&self, code: FaultCode, data: u32) {
        self.code.store(code as u8, Ordering::Release);
        self.data.store(data, Ordering::Release);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.active.store(true, Ordering::Release);
    }

    /// Record an error. Errors that are not faults are ignored.
    pub fn record(&self, error: &Error) {
        let code = error.fault_code();
        if code != FaultCode::None {
            self.set(code, error.data());
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Get fault code (only meaningful if `is_active()` is true).
    #[inline]
    pub fn code(&self) -> FaultCode {
        FaultCode::from_u8(self.code.load(Ordering::Acquire))
    }

    #[inline]
    pub fn data(&self) -> u32 {
        self.data.load(Ordering::Acquire)
    }

    #[inline]
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }

    /// Clear the active flag. The counter is kept.
    #[inline]
    pub fn clear(&self) {
        self.active.store(false, Ordering::Release);
    }

    #[inline]
    pub fn snapshot(&self) -> FaultSnapshot {
        FaultSnapshot {
            active: self.is_active(),
            code: self.code(),
            data: self.data(),
            count: self.count(),
        }
    }
}

impl Default for FaultState {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of fault state at a point in time.
#[derive(Clone, Copy, Debug)]
pub struct FaultSnapshot {
    pub active: bool,
    pub code: FaultCode,
    pub data: u32,
    pub count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_state_basic() {
        let fault = FaultState::new();

        assert!(!fault.is_active());
        assert_eq!(fault.code(), FaultCode::None);
        assert_eq!(fault.count(), 0);

        fault.set(FaultCode::HeaderMode, 0xFF);

        assert!(fault.is_active());
        assert_eq!(fault.code(), FaultCode::HeaderMode);
        assert_eq!(fault.data(), 0xFF);
        assert_eq!(fault.count(), 1);

        fault.clear();

        assert!(!fault.is_active());
        assert_eq!(fault.count(), 1); // Count preserved
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let fault = FaultState::new();
        fault.record(&Error::InvalidToneLength(0x42));
        fault.record(&Error::Storage);

        let snap = fault.snapshot();
        assert!(snap.active);
        assert_eq!(snap.code, FaultCode::Storage);
        assert_eq!(snap.data, 0);
        assert_eq!(snap.count, 2);

        fault.clear();
        assert!(!fault.snapshot().active);
        assert_eq!(fault.snapshot().count, 2);
    }

    #[test]
    fn test_record_skips_non_faults() {
        let fault = FaultState::new();
        fault.record(&Error::EmptySlot);
        assert!(!fault.is_active());

        fault.record(&Error::CorruptSlot(9));
        assert_eq!(fault.code(), FaultCode::CorruptSlot);
        assert_eq!(fault.data(), 9);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(Error::Storage.to_string(), "E01: storage error");
        assert_eq!(Error::InvalidMode(0xFF).to_string(), "E02: invalid startup mode (0xFF)");
    }
}
