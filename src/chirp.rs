//! Diagnostic chirps: the only user-visible status channel.

use crate::dispatch::{play_steps, Step, ToneSink};

const fn tone(ms: u16, freq: u16) -> Step {
    Step::Tone { ms, a: freq, b: freq }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Chirp {
    /// Startup key accepted (override, or entering set-default)
    Acknowledge,
    /// New power-on defaults persisted
    Saved,
    /// Stored startup mode invalid, default mode in use
    ModeFallback,
    /// Stored tone length invalid, fast length in use
    LengthFallback,
    /// Playback mode on (rising pair)
    PlaybackOn,
    /// Playback mode off (falling pair)
    PlaybackOff,
    /// About to write a memory
    StoreBegin,
    /// Memory written
    StoreDone,
    /// Rejected key, unreadable memory or failed write
    Error,
}

const ACKNOWLEDGE: &[Step] = &[tone(1000, 1700)];
const SAVED: &[Step] = &[tone(100, 1700), Step::Gap(100), tone(100, 1700)];
const MODE_FALLBACK: &[Step] = &[
    tone(100, 440),
    Step::Gap(100),
    tone(100, 440),
    Step::Gap(100),
    tone(100, 440),
];
const LENGTH_FALLBACK: &[Step] = &[tone(100, 2200), Step::Gap(100), tone(100, 2200)];
const PLAYBACK_ON: &[Step] = &[tone(100, 1000), tone(100, 2000)];
const PLAYBACK_OFF: &[Step] = &[tone(100, 2000), tone(100, 1000)];
const STORE_BEGIN: &[Step] = &[tone(100, 1500)];
const STORE_DONE: &[Step] = &[tone(100, 1500), Step::Gap(50), tone(100, 1500)];
const ERROR: &[Step] = &[tone(150, 400), Step::Gap(50), tone(150, 300)];

impl Chirp {
    pub fn steps(self) -> &'static [Step] {
        match self {
            Chirp::Acknowledge => ACKNOWLEDGE,
            Chirp::Saved => SAVED,
            Chirp::ModeFallback => MODE_FALLBACK,
            Chirp::LengthFallback => LENGTH_FALLBACK,
            Chirp::PlaybackOn => PLAYBACK_ON,
            Chirp::PlaybackOff => PLAYBACK_OFF,
            Chirp::StoreBegin => STORE_BEGIN,
            Chirp::StoreDone => STORE_DONE,
            Chirp::Error => ERROR,
        }
    }

    /// Tone events only, in order.
    pub fn tones(self) -> impl Iterator<Item = (u16, u16, u16)> {
        self.steps().iter().filter_map(|s| match *s {
            Step::Tone { ms, a, b } => Some((ms, a, b)),
            Step::Gap(_) => None,
        })
    }

    pub fn play<S: ToneSink + ?Sized>(self, sink: &mut S) {
        play_steps(sink, self.steps());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playback_pair_is_up_then_down() {
        let on: Vec<_> = Chirp::PlaybackOn.tones().collect();
        let off: Vec<_> = Chirp::PlaybackOff.tones().collect();
        assert!(on[0].1 < on[1].1);
        assert!(off[0].1 > off[1].1);
    }

    #[test]
    fn test_fallback_chirps_differ() {
        assert_ne!(Chirp::ModeFallback.steps(), Chirp::LengthFallback.steps());
        assert_ne!(Chirp::StoreBegin.steps(), Chirp::StoreDone.steps());
    }
}
