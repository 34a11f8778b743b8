//! Module: keypad
//!
//! Purpose: Decode a resistor-ladder keypad read through one ADC pin.
//!
//! Architecture:
//! - `KeyCode`: the 13 logical keys, numbered like the stored memory bytes
//! - `KeypadLayout`: voltage band table (lower bound exclusive, upper inclusive)
//! - `get_key`: two conversions a debounce interval apart; unequal readings
//!   are retried, equal ones are classified
//!
//! Only 12-key + SEIZE ladders are supported; there are no A-D keys.

use crate::audio::Synth;
use crate::config::BlueboxConfig;
use crate::hal::Board;

/// Logical key. Discriminants are the on-wire/in-memory codes.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyCode {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
    Star = 10,
    Zero = 11,
    Hash = 12,
    Seize = 13,
}

impl KeyCode {
    pub const ALL: [KeyCode; 13] = [
        KeyCode::One,
        KeyCode::Two,
        KeyCode::Three,
        KeyCode::Four,
        KeyCode::Five,
        KeyCode::Six,
        KeyCode::Seven,
        KeyCode::Eight,
        KeyCode::Nine,
        KeyCode::Star,
        KeyCode::Zero,
        KeyCode::Hash,
        KeyCode::Seize,
    ];

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1..=13 => Some(Self::ALL[code as usize - 1]),
            _ => None,
        }
    }

    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Dialed digit value: 1-9 for themselves, 10 for zero.
    pub fn digit(self) -> Option<u8> {
        match self {
            KeyCode::Zero => Some(10),
            KeyCode::Star | KeyCode::Hash | KeyCode::Seize => None,
            k => Some(k.code()),
        }
    }

    /// Memory slot (1..=12) owned by this key. SEIZE has none.
    pub fn memory_slot(self) -> Option<u8> {
        match self {
            KeyCode::Seize => None,
            k => Some(k.code()),
        }
    }
}

/// One voltage band: `above < reading <= upto`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyBand {
    pub above: u8,
    pub upto: u8,
    pub key: KeyCode,
}

const fn band(above: u8, upto: u8, key: KeyCode) -> KeyBand {
    KeyBand { above, upto, key }
}

/// Reading thresholds, highest voltage first
const BAND_EDGES: [(u8, u8); 13] = [
    (232, 255),
    (210, 232),
    (191, 210),
    (173, 191),
    (154, 173),
    (136, 154),
    (118, 136),
    (100, 118),
    (81, 100),
    (63, 81),
    (45, 63),
    (26, 45),
    (8, 26),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeypadLayout {
    bands: [KeyBand; 13],
}

impl KeypadLayout {
    /// KEY_1 at the top of the ladder, SEIZE at the bottom.
    pub const STANDARD: Self = Self::from_edges(false);

    /// Same ladder wired upside down: SEIZE at the top.
    pub const REVERSED: Self = Self::from_edges(true);

    const fn from_edges(reversed: bool) -> Self {
        let mut bands = [band(0, 0, KeyCode::One); 13];
        let mut i = 0;
        while i < 13 {
            let key = if reversed {
                KeyCode::ALL[12 - i]
            } else {
                KeyCode::ALL[i]
            };
            bands[i] = band(BAND_EDGES[i].0, BAND_EDGES[i].1, key);
            i += 1;
        }
        Self { bands }
    }

    pub fn bands(&self) -> &[KeyBand; 13] {
        &self.bands
    }

    /// Map a settled reading to a key. Below `noise_floor` is no key.
    pub fn classify(&self, reading: u8, noise_floor: u8) -> Option<KeyCode> {
        if reading < noise_floor {
            return None;
        }
        self.bands
            .iter()
            .find(|b| reading > b.above && reading <= b.upto)
            .map(|b| b.key)
    }
}

impl Default for KeypadLayout {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Debounced key read.
///
/// Blocks for at least one debounce interval; retries until two consecutive
/// conversions agree.
pub fn get_key<B: Board>(synth: &mut Synth<'_, B>, config: &BlueboxConfig) -> Option<KeyCode> {
    loop {
        let first = synth.board_mut().read_adc();
        synth.sleep_ms(config.debounce_wait_ms());
        let second = synth.board_mut().read_adc();
        if first == second {
            return config.layout.classify(first, config.noise_floor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_edges() {
        let l = KeypadLayout::STANDARD;
        assert_eq!(l.classify(255, 9), Some(KeyCode::One));
        assert_eq!(l.classify(233, 9), Some(KeyCode::One));
        assert_eq!(l.classify(232, 9), Some(KeyCode::Two));
        assert_eq!(l.classify(211, 9), Some(KeyCode::Two));
        assert_eq!(l.classify(210, 9), Some(KeyCode::Three));
        assert_eq!(l.classify(64, 9), Some(KeyCode::Star));
        assert_eq!(l.classify(63, 9), Some(KeyCode::Zero));
        assert_eq!(l.classify(27, 9), Some(KeyCode::Hash));
        assert_eq!(l.classify(26, 9), Some(KeyCode::Seize));
        assert_eq!(l.classify(9, 9), Some(KeyCode::Seize));
    }

    #[test]
    fn test_noise_floor() {
        let l = KeypadLayout::STANDARD;
        assert_eq!(l.classify(8, 9), None);
        assert_eq!(l.classify(0, 9), None);
        // Raising the floor masks the bottom band
        assert_eq!(l.classify(20, 30), None);
    }

    #[test]
    fn test_every_reading_has_at_most_one_key() {
        let l = KeypadLayout::STANDARD;
        for r in 0..=255u8 {
            let hits = l
                .bands()
                .iter()
                .filter(|b| r > b.above && r <= b.upto)
                .count();
            assert!(hits <= 1, "reading {} matched {} bands", r, hits);
            if r >= 9 {
                assert_eq!(hits, 1, "reading {} unmapped", r);
            }
        }
    }

    #[test]
    fn test_reversed_layout() {
        let l = KeypadLayout::REVERSED;
        assert_eq!(l.classify(250, 9), Some(KeyCode::Seize));
        assert_eq!(l.classify(20, 9), Some(KeyCode::One));
        assert_eq!(l.classify(120, 9), Some(KeyCode::Seven));
    }

    #[test]
    fn test_key_codes() {
        for (i, k) in KeyCode::ALL.iter().enumerate() {
            assert_eq!(k.code() as usize, i + 1);
            assert_eq!(KeyCode::from_code(k.code()), Some(*k));
        }
        assert_eq!(KeyCode::from_code(0), None);
        assert_eq!(KeyCode::from_code(14), None);
        assert_eq!(KeyCode::from_code(0xFF), None);
    }

    #[test]
    fn test_digits_and_slots() {
        assert_eq!(KeyCode::Zero.digit(), Some(10));
        assert_eq!(KeyCode::Seven.digit(), Some(7));
        assert_eq!(KeyCode::Star.digit(), None);
        assert_eq!(KeyCode::Hash.memory_slot(), Some(12));
        assert_eq!(KeyCode::Seize.memory_slot(), None);
    }
}
