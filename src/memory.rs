//! Module: memory
//!
//! Purpose: Persistent header and keystroke memories.
//!
//! Architecture:
//! - Byte image layout (compatible with 512-byte EEPROM devices):
//!
//! ```text
//! 0        reserved
//! 1        startup mode   (ToneMode byte)
//! 2        startup length (75 or 120)
//! 3..495   12 chunks x 41 bytes: [mode][up to 40 key codes][0xFF pad]
//! ```
//!
//! - Chunk N (1..=12) belongs to the key with code N
//! - `store` drains the key history into a chunk in one block write
//! - `playback` replays a chunk under its own mode, then restores the live one
//!
//! Erased storage reads as `0xFF`; an erased mode byte is an empty slot.

use crate::audio::Synth;
use crate::chirp::Chirp;
use crate::config::{BlueboxConfig, ToneLength};
use crate::dispatch::{dispatch, ToneMode};
use crate::fault::Error;
use crate::hal::Board;
use crate::keypad::KeyCode;
use crate::ring::KeyRing;

/// Erased byte / key list terminator
pub const ERASED: u8 = 0xFF;

pub const HEADER_RESERVED_ADDR: usize = 0;
pub const HEADER_MODE_ADDR: usize = 1;
pub const HEADER_LENGTH_ADDR: usize = 2;

/// First chunk offset
pub const CHUNK_BASE: usize = 3;

/// Key codes per chunk (also the key history capacity)
pub const CHUNK_KEYS: usize = 40;

/// Mode byte + keys
pub const CHUNK_SIZE: usize = 1 + CHUNK_KEYS;

pub const CHUNK_COUNT: usize = 12;

/// Total persistent image size
pub const IMAGE_SIZE: usize = CHUNK_BASE + CHUNK_SIZE * CHUNK_COUNT;

/// Image offset of chunk `slot` (1..=12).
pub fn chunk_addr(slot: u8) -> Option<usize> {
    match slot as usize {
        n @ 1..=CHUNK_COUNT => Some(CHUNK_BASE + (n - 1) * CHUNK_SIZE),
        _ => None,
    }
}

/// Power-on defaults as stored in bytes 1-2.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub mode: ToneMode,
    pub tone_length: ToneLength,
}

impl Header {
    pub fn to_bytes(self) -> [u8; 2] {
        [self.mode.as_byte(), self.tone_length.as_byte()]
    }
}

/// Result of validating a stored header.
///
/// Invalid fields are replaced in `header`; the stored bytes are left alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeaderCheck {
    pub header: Header,
    pub mode_error: Option<Error>,
    pub length_error: Option<Error>,
}

/// Validate raw header bytes `[mode, length]`, each field independently.
pub fn validate_header(raw: [u8; 2], config: &BlueboxConfig) -> HeaderCheck {
    let (mode, mode_error) = match ToneMode::from_byte(raw[0]) {
        Some(mode) => (mode, None),
        None => (config.default_mode, Some(Error::InvalidMode(raw[0]))),
    };
    let (tone_length, length_error) = match ToneLength::from_byte(raw[1]) {
        Some(length) => (length, None),
        None => (
            config.default_tone_length,
            Some(Error::InvalidToneLength(raw[1])),
        ),
    };
    HeaderCheck {
        header: Header { mode, tone_length },
        mode_error,
        length_error,
    }
}

pub fn read_header<B: Board>(board: &mut B) -> Result<[u8; 2], Error> {
    let mut raw = [ERASED; 2];
    board
        .read_persistent(HEADER_MODE_ADDR, &mut raw)
        .map_err(|_| Error::Storage)?;
    Ok(raw)
}

pub fn write_header<B: Board>(board: &mut B, header: Header) -> Result<(), Error> {
    board
        .write_persistent(HEADER_MODE_ADDR, &header.to_bytes())
        .map_err(|_| Error::Storage)
}

/// One memory slot, byte-exact.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chunk {
    bytes: [u8; CHUNK_SIZE],
}

impl Chunk {
    pub const ERASED: Self = Self {
        bytes: [ERASED; CHUNK_SIZE],
    };

    pub fn from_bytes(bytes: [u8; CHUNK_SIZE]) -> Self {
        Self { bytes }
    }

    /// Build a chunk from `mode` and up to [`CHUNK_KEYS`] key codes.
    pub fn new(mode: ToneMode, keys: &[u8]) -> Self {
        let mut bytes = [ERASED; CHUNK_SIZE];
        bytes[0] = mode.as_byte();
        let n = keys.len().min(CHUNK_KEYS);
        bytes[1..1 + n].copy_from_slice(&keys[..n]);
        Self { bytes }
    }

    /// Drain `ring` into a new chunk (oldest key first).
    pub fn drain_from<const N: usize>(mode: ToneMode, ring: &KeyRing<N>) -> Self {
        let mut bytes = [ERASED; CHUNK_SIZE];
        bytes[0] = mode.as_byte();
        for slot in bytes[1..].iter_mut() {
            match ring.remove() {
                Some(code) => *slot = code,
                None => break,
            }
        }
        // Anything past capacity is dropped
        ring.init();
        Self { bytes }
    }

    /// Stored mode. Erased means never written.
    pub fn mode(&self) -> Result<ToneMode, Error> {
        match self.bytes[0] {
            ERASED => Err(Error::EmptySlot),
            b => ToneMode::from_byte(b).ok_or(Error::CorruptSlot(b)),
        }
    }

    /// Stored key codes up to the terminator.
    pub fn keys(&self) -> impl Iterator<Item = u8> + '_ {
        self.bytes[1..].iter().copied().take_while(|&b| b != ERASED)
    }

    pub fn as_bytes(&self) -> &[u8; CHUNK_SIZE] {
        &self.bytes
    }
}

pub fn read_chunk<B: Board>(board: &mut B, slot: u8) -> Result<Chunk, Error> {
    let addr = chunk_addr(slot).ok_or(Error::NotAMemoryKey)?;
    let mut bytes = [ERASED; CHUNK_SIZE];
    board
        .read_persistent(addr, &mut bytes)
        .map_err(|_| Error::Storage)?;
    Ok(Chunk::from_bytes(bytes))
}

pub fn write_chunk<B: Board>(board: &mut B, slot: u8, chunk: &Chunk) -> Result<(), Error> {
    let addr = chunk_addr(slot).ok_or(Error::NotAMemoryKey)?;
    board
        .write_persistent(addr, chunk.as_bytes())
        .map_err(|_| Error::Storage)
}

/// Record the key history into `key`'s slot under `mode`.
///
/// Chirps before and after. The history is empty afterwards even if the
/// write fails. Returns the number of keys stored.
pub fn store<B: Board, const N: usize>(
    synth: &mut Synth<'_, B>,
    ring: &KeyRing<N>,
    mode: ToneMode,
    key: KeyCode,
) -> Result<usize, Error> {
    let slot = key.memory_slot().ok_or(Error::NotAMemoryKey)?;
    Chirp::StoreBegin.play(synth);

    let chunk = Chunk::drain_from(mode, ring);
    write_chunk(synth.board_mut(), slot, &chunk)?;

    Chirp::StoreDone.play(synth);
    Ok(chunk.keys().count())
}

/// Replay `key`'s slot.
///
/// `live_mode` is switched to the stored mode for the duration and restored
/// afterwards. Empty or corrupt slots play nothing. Returns the number of
/// keys replayed.
pub fn playback<B: Board>(
    synth: &mut Synth<'_, B>,
    key: KeyCode,
    live_mode: &mut ToneMode,
    tone_length: ToneLength,
) -> Result<usize, Error> {
    let slot = key.memory_slot().ok_or(Error::NotAMemoryKey)?;
    let chunk = read_chunk(synth.board_mut(), slot)?;
    let stored_mode = chunk.mode()?;

    let saved = core::mem::replace(live_mode, stored_mode);
    let mut replayed = 0;
    for code in chunk.keys() {
        // Unknown codes are skipped, not fatal
        if let Some(k) = KeyCode::from_code(code) {
            dispatch(synth, *live_mode, k, tone_length, true);
            replayed += 1;
        }
    }
    *live_mode = saved;

    Ok(replayed)
}
