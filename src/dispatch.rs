//! Module: dispatch
//!
//! Purpose: Map (signaling mode, key) to the tone sequence it sounds.
//!
//! Architecture:
//! - `ToneMode`: the five playable modes, numbered like header byte 1
//! - `Step`: one element of a sequence (tone or silent gap); fixed sequences
//!   are `'static` tables
//! - `ToneSink`: where sequences go (`Synth` on hardware, a recorder in tests)
//! - `dispatch`: the lookup, plus the optional per-mode pause used when
//!   replaying a memory
//!
//! Unknown (mode, key) pairs sound nothing and add no pause.

use crate::config::{
    ToneLength, COIN_PAUSE, KP_LENGTH, PULSE_BREAK, PULSE_MAKE, PULSE_PAUSE, SEIZE_FREQ,
    SEIZE_LENGTH, SEIZE_PAUSE,
};
use crate::keypad::KeyCode;

/// Signaling mode.
///
/// An erased byte (`0xFF`) or anything else outside 1..=5 is not a mode;
/// [`ToneMode::from_byte`] returns `None` for it.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToneMode {
    Mf = 1,
    Dtmf = 2,
    Redbox = 3,
    Greenbox = 4,
    Pulse = 5,
}

impl ToneMode {
    pub fn from_byte(value: u8) -> Option<Self> {
        match value {
            1 => Some(ToneMode::Mf),
            2 => Some(ToneMode::Dtmf),
            3 => Some(ToneMode::Redbox),
            4 => Some(ToneMode::Greenbox),
            5 => Some(ToneMode::Pulse),
            _ => None,
        }
    }

    #[inline]
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Mode picked by holding a digit at power-on (keys 1-5).
    pub fn from_selector_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::One => Some(ToneMode::Mf),
            KeyCode::Two => Some(ToneMode::Dtmf),
            KeyCode::Three => Some(ToneMode::Redbox),
            KeyCode::Four => Some(ToneMode::Greenbox),
            KeyCode::Five => Some(ToneMode::Pulse),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ToneMode::Mf => "MF",
            ToneMode::Dtmf => "DTMF",
            ToneMode::Redbox => "REDBOX",
            ToneMode::Greenbox => "GREENBOX",
            ToneMode::Pulse => "PULSE",
        }
    }

    /// Spacing added after each replayed key.
    pub fn pause_ms(self, tone_length: ToneLength) -> u16 {
        match self {
            ToneMode::Mf | ToneMode::Dtmf => tone_length.ms(),
            ToneMode::Redbox | ToneMode::Greenbox => COIN_PAUSE,
            ToneMode::Pulse => PULSE_PAUSE,
        }
    }
}

/// Destination for tone sequences.
pub trait ToneSink {
    /// Sound two frequencies together for `duration_ms`. Blocking.
    fn play(&mut self, duration_ms: u16, freq_a: u16, freq_b: u16);

    /// Stay silent for `ms`. Blocking.
    fn pause(&mut self, ms: u16);
}

/// One element of a fixed tone sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Tone { ms: u16, a: u16, b: u16 },
    Gap(u16),
}

const fn tone(ms: u16, a: u16, b: u16) -> Step {
    Step::Tone { ms, a, b }
}

pub fn play_steps<S: ToneSink + ?Sized>(sink: &mut S, steps: &[Step]) {
    for step in steps {
        match *step {
            Step::Tone { ms, a, b } => sink.play(ms, a, b),
            Step::Gap(ms) => sink.pause(ms),
        }
    }
}

const COIN: (u16, u16) = (1700, 2200);

/// US nickel: one 66 ms beep
pub const REDBOX_NICKEL: &[Step] = &[tone(66, COIN.0, COIN.1)];

/// US dime: two 66 ms beeps
pub const REDBOX_DIME: &[Step] = &[
    tone(66, COIN.0, COIN.1),
    Step::Gap(66),
    tone(66, COIN.0, COIN.1),
];

/// US quarter: five 33 ms beeps
pub const REDBOX_QUARTER: &[Step] = &[
    tone(33, COIN.0, COIN.1),
    Step::Gap(33),
    tone(33, COIN.0, COIN.1),
    Step::Gap(33),
    tone(33, COIN.0, COIN.1),
    Step::Gap(33),
    tone(33, COIN.0, COIN.1),
    Step::Gap(33),
    tone(33, COIN.0, COIN.1),
];

/// UK 10 pence
pub const REDBOX_UK_10P: &[Step] = &[tone(200, 1000, 1000)];

/// UK 50 pence
pub const REDBOX_UK_50P: &[Step] = &[tone(350, 1000, 1000)];

const WINK_2600: Step = tone(90, SEIZE_FREQ, SEIZE_FREQ);
const WINK_MF8: Step = tone(90, 900, 1500);
const COIN_COLLECT: Step = tone(900, 700, 1100);
const COIN_RETURN: Step = tone(900, 1100, 1700);
const RINGBACK: Step = tone(900, 700, 1700);

pub const GREENBOX_COLLECT_2600: &[Step] = &[WINK_2600, Step::Gap(60), COIN_COLLECT];
pub const GREENBOX_RETURN_2600: &[Step] = &[WINK_2600, Step::Gap(60), COIN_RETURN];
pub const GREENBOX_RINGBACK_2600: &[Step] = &[WINK_2600, Step::Gap(6), RINGBACK];
pub const GREENBOX_COLLECT_MF8: &[Step] = &[WINK_MF8, Step::Gap(60), COIN_COLLECT];
pub const GREENBOX_RETURN_MF8: &[Step] = &[WINK_MF8, Step::Gap(60), COIN_RETURN];
pub const GREENBOX_RINGBACK_MF8: &[Step] = &[WINK_MF8, Step::Gap(6), RINGBACK];

/// MF pair for a key. STAR is KP, HASH is ST.
pub fn mf_pair(key: KeyCode) -> Option<(u16, u16)> {
    let pair = match key {
        KeyCode::One => (700, 900),
        KeyCode::Two => (700, 1100),
        KeyCode::Three => (900, 1100),
        KeyCode::Four => (700, 1300),
        KeyCode::Five => (900, 1300),
        KeyCode::Six => (1100, 1300),
        KeyCode::Seven => (700, 1500),
        KeyCode::Eight => (900, 1500),
        KeyCode::Nine => (1100, 1500),
        KeyCode::Star => (1100, 1700),
        KeyCode::Zero => (1300, 1500),
        KeyCode::Hash => (1500, 1700),
        KeyCode::Seize => return None,
    };
    Some(pair)
}

/// DTMF row/column pair for a key.
pub fn dtmf_pair(key: KeyCode) -> Option<(u16, u16)> {
    const ROWS: [u16; 4] = [697, 770, 852, 941];
    const COLS: [u16; 3] = [1209, 1336, 1477];
    let (row, col) = match key {
        KeyCode::Star => (3, 0),
        KeyCode::Zero => (3, 1),
        KeyCode::Hash => (3, 2),
        KeyCode::Seize => return None,
        k => {
            let n = (k.code() - 1) as usize;
            (n / 3, n % 3)
        }
    };
    Some((ROWS[row], COLS[col]))
}

pub fn redbox_steps(key: KeyCode) -> Option<&'static [Step]> {
    match key {
        KeyCode::One => Some(REDBOX_NICKEL),
        KeyCode::Two => Some(REDBOX_DIME),
        KeyCode::Three => Some(REDBOX_QUARTER),
        KeyCode::Four => Some(REDBOX_UK_10P),
        KeyCode::Five => Some(REDBOX_UK_50P),
        _ => None,
    }
}

pub fn greenbox_steps(key: KeyCode) -> Option<&'static [Step]> {
    match key {
        KeyCode::One => Some(GREENBOX_COLLECT_2600),
        KeyCode::Two => Some(GREENBOX_RETURN_2600),
        KeyCode::Three => Some(GREENBOX_RINGBACK_2600),
        KeyCode::Four => Some(GREENBOX_COLLECT_MF8),
        KeyCode::Five => Some(GREENBOX_RETURN_MF8),
        KeyCode::Six => Some(GREENBOX_RINGBACK_MF8),
        _ => None,
    }
}

/// Pulse-dial a digit: `n` bursts of 2600 Hz, each followed by its make gap.
pub fn play_pulses<S: ToneSink + ?Sized>(sink: &mut S, count: u8) {
    for _ in 0..count {
        sink.play(PULSE_BREAK, SEIZE_FREQ, SEIZE_FREQ);
        sink.pause(PULSE_MAKE);
    }
}

/// Sound `key` under `mode`.
///
/// SEIZE is 2600 Hz for [`SEIZE_LENGTH`] in every mode. With `pause_after`
/// set, a mode-specific silence follows anything that sounded.
pub fn dispatch<S: ToneSink + ?Sized>(
    sink: &mut S,
    mode: ToneMode,
    key: KeyCode,
    tone_length: ToneLength,
    pause_after: bool,
) {
    if key == KeyCode::Seize {
        sink.play(SEIZE_LENGTH, SEIZE_FREQ, SEIZE_FREQ);
        if pause_after {
            sink.pause(SEIZE_PAUSE);
        }
        return;
    }

    let sounded = match mode {
        ToneMode::Mf => match mf_pair(key) {
            Some((a, b)) => {
                let ms = if key == KeyCode::Star {
                    KP_LENGTH
                } else {
                    tone_length.ms()
                };
                sink.play(ms, a, b);
                true
            }
            None => false,
        },
        ToneMode::Dtmf => match dtmf_pair(key) {
            Some((a, b)) => {
                sink.play(tone_length.ms(), a, b);
                true
            }
            None => false,
        },
        ToneMode::Redbox => redbox_steps(key)
            .map(|steps| play_steps(sink, steps))
            .is_some(),
        ToneMode::Greenbox => greenbox_steps(key)
            .map(|steps| play_steps(sink, steps))
            .is_some(),
        ToneMode::Pulse => match key.digit() {
            Some(n) => {
                play_pulses(sink, n);
                true
            }
            None => false,
        },
    };

    if sounded && pause_after {
        sink.pause(mode.pause_ms(tone_length));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<Step>);

    impl ToneSink for Recorder {
        fn play(&mut self, ms: u16, a: u16, b: u16) {
            self.0.push(Step::Tone { ms, a, b });
        }
        fn pause(&mut self, ms: u16) {
            self.0.push(Step::Gap(ms));
        }
    }

    #[test]
    fn test_mode_bytes() {
        for b in 1..=5u8 {
            assert_eq!(ToneMode::from_byte(b).map(ToneMode::as_byte), Some(b));
        }
        assert_eq!(ToneMode::from_byte(0), None);
        assert_eq!(ToneMode::from_byte(6), None);
        assert_eq!(ToneMode::from_byte(0xFF), None);
    }

    #[test]
    fn test_dtmf_grid() {
        assert_eq!(dtmf_pair(KeyCode::One), Some((697, 1209)));
        assert_eq!(dtmf_pair(KeyCode::Six), Some((770, 1477)));
        assert_eq!(dtmf_pair(KeyCode::Eight), Some((852, 1336)));
        assert_eq!(dtmf_pair(KeyCode::Zero), Some((941, 1336)));
    }

    #[test]
    fn test_unknown_pair_is_silent() {
        let mut rec = Recorder::default();
        dispatch(&mut rec, ToneMode::Redbox, KeyCode::Nine, ToneLength::Fast, true);
        dispatch(&mut rec, ToneMode::Greenbox, KeyCode::Hash, ToneLength::Fast, true);
        dispatch(&mut rec, ToneMode::Pulse, KeyCode::Star, ToneLength::Fast, true);
        assert!(rec.0.is_empty());
    }

    #[test]
    fn test_pause_after_per_mode() {
        let mut rec = Recorder::default();
        dispatch(&mut rec, ToneMode::Dtmf, KeyCode::One, ToneLength::Slow, true);
        assert_eq!(rec.0.last(), Some(&Step::Gap(120)));

        let mut rec = Recorder::default();
        dispatch(&mut rec, ToneMode::Redbox, KeyCode::One, ToneLength::Fast, true);
        assert_eq!(rec.0.last(), Some(&Step::Gap(COIN_PAUSE)));

        let mut rec = Recorder::default();
        dispatch(&mut rec, ToneMode::Pulse, KeyCode::Two, ToneLength::Fast, true);
        assert_eq!(rec.0.last(), Some(&Step::Gap(PULSE_PAUSE)));
    }
}
