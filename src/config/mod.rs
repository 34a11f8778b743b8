//! Module: config
//!
//! Purpose: Build-time and boot-time configuration for RustBluebox.
//!
//! Architecture:
//! - Timing and tone constants shared by every signaling mode
//! - `BlueboxConfig`: one `Copy` value chosen once at startup (carrier rate,
//!   keypad wiring, long-press threshold, SEIZE policy, defaults)
//! - `nvs`: persistent byte image backing the header and memory chunks
//!
//! Safety: Safe. Plain data, no interior mutability.

pub mod nvs;

use crate::dispatch::ToneMode;
use crate::keypad::KeypadLayout;

/// Tone length for MF/DTMF digits when set to fast (ms).
pub const TONE_LENGTH_FAST: u8 = 75;

/// Tone length for MF/DTMF digits when set to slow (ms).
pub const TONE_LENGTH_SLOW: u8 = 120;

/// MF KP tone length (ms).
pub const KP_LENGTH: u16 = 120;

/// Line seizure: 2600 Hz for one second.
pub const SEIZE_LENGTH: u16 = 1000;
pub const SEIZE_FREQ: u16 = 2600;

/// Extra silence after a seize when replaying a memory (ms).
pub const SEIZE_PAUSE: u16 = 1500;

/// Pulse dialing: tone burst (break) and gap (make), 10 pps.
pub const PULSE_BREAK: u16 = 66;
pub const PULSE_MAKE: u16 = 34;

/// Inter-digit pause after a pulse train during memory playback (ms).
pub const PULSE_PAUSE: u16 = 500;

/// Spacing between replayed coin signals (ms).
pub const COIN_PAUSE: u16 = 500;

/// Digit tone length selector.
///
/// Stored as its millisecond value in header byte 2.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToneLength {
    Fast,
    Slow,
}

impl ToneLength {
    /// Decode a header byte. Only the two exact values are valid.
    pub fn from_byte(value: u8) -> Option<Self> {
        match value {
            TONE_LENGTH_FAST => Some(ToneLength::Fast),
            TONE_LENGTH_SLOW => Some(ToneLength::Slow),
            _ => None,
        }
    }

    #[inline]
    pub fn as_byte(self) -> u8 {
        match self {
            ToneLength::Fast => TONE_LENGTH_FAST,
            ToneLength::Slow => TONE_LENGTH_SLOW,
        }
    }

    #[inline]
    pub fn ms(self) -> u16 {
        self.as_byte() as u16
    }

    pub fn toggled(self) -> Self {
        match self {
            ToneLength::Fast => ToneLength::Slow,
            ToneLength::Slow => ToneLength::Fast,
        }
    }
}

impl Default for ToneLength {
    fn default() -> Self {
        ToneLength::Fast
    }
}

/// What a short SEIZE press does while playback mode is active.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeizePolicy {
    /// SEIZE still plays 2600 Hz live.
    Live,
    /// SEIZE only acts through its long press (playback toggle).
    Ignored,
}

/// Firmware configuration, fixed for the lifetime of one boot.
#[derive(Clone, Copy, Debug)]
pub struct BlueboxConfig {
    /// Carrier timer overflow rate in Hz.
    pub carrier_hz: u32,

    /// Debounce window in ms; the decoder waits a third of it between samples.
    pub debounce_ms: u16,

    /// Hold time before a long press fires (and repeats), in ms.
    pub longpress_ms: u16,

    /// ADC readings below this are "no key".
    pub noise_floor: u8,

    /// Voltage band table for the fitted keypad.
    pub layout: KeypadLayout,

    /// Short-press SEIZE behavior in playback mode.
    pub seize_in_playback: SeizePolicy,

    /// Mode used when the stored startup mode is invalid.
    pub default_mode: ToneMode,

    /// Tone length used when the stored one is invalid.
    pub default_tone_length: ToneLength,
}

impl BlueboxConfig {
    pub const DEFAULT: Self = Self {
        carrier_hz: 32_000,
        debounce_ms: 25,
        longpress_ms: 1000,
        noise_floor: 9,
        layout: KeypadLayout::STANDARD,
        seize_in_playback: SeizePolicy::Live,
        default_mode: ToneMode::Mf,
        default_tone_length: ToneLength::Fast,
    };

    /// Delay between the two debounce conversions.
    #[inline]
    pub fn debounce_wait_ms(&self) -> u16 {
        self.debounce_ms / 3
    }
}

impl Default for BlueboxConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
