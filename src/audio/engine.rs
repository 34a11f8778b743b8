//! Shared tone engine: the state both execution contexts touch.
//!
//! The ISR side ([`ToneEngine::on_carrier_tick`]) reads the voice pair and the
//! tones-on flag and drives the timing flags. The control side arms tones and
//! the long-press countdown. Voice updates go through a critical section so
//! the ISR never mixes one new and one stale oscillator.

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};

use critical_section::Mutex;

use super::lut::SILENCE_LEVEL;
use super::oscillator::Oscillator;
use crate::hal::OutputLevel;
use crate::timing::{LongPressArbiter, MillisecondClock};

/// Two voices plus the frequencies they were built from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Voices {
    a: Oscillator,
    b: Oscillator,
    freq_a: u16,
    freq_b: u16,
}

impl Voices {
    const IDLE: Self = Self {
        a: Oscillator::IDLE,
        b: Oscillator::IDLE,
        freq_a: 0,
        freq_b: 0,
    };
}

pub struct ToneEngine {
    carrier_hz: u32,
    voices: Mutex<Cell<Voices>>,
    tones_on: AtomicBool,
    clock: MillisecondClock,
    long_press: LongPressArbiter,
}

impl ToneEngine {
    /// Engine for a carrier running at `carrier_hz`. Usable in a `static`.
    pub const fn new(carrier_hz: u32) -> Self {
        Self {
            carrier_hz,
            voices: Mutex::new(Cell::new(Voices::IDLE)),
            tones_on: AtomicBool::new(false),
            clock: MillisecondClock::new(carrier_hz),
            long_press: LongPressArbiter::new(),
        }
    }

    /// One carrier period (ISR).
    ///
    /// Mixes both voices into `out` (silence while tones are off), then runs
    /// the millisecond divider and, on a boundary, the long-press countdown.
    pub fn on_carrier_tick<O: OutputLevel>(&self, out: &mut O) {
        if self.tones_on.load(Ordering::Acquire) {
            let level = critical_section::with(|cs| {
                let cell = self.voices.borrow(cs);
                let mut voices = cell.get();
                let level = voices.a.sample() + voices.b.sample();
                voices.a.advance();
                voices.b.advance();
                cell.set(voices);
                level
            });
            out.set_output_level(level);
        } else {
            out.set_output_level(SILENCE_LEVEL);
        }

        if self.clock.tick() {
            self.long_press.on_millisecond();
        }
    }

    /// Load both voices at phase 0 and switch tones on.
    ///
    /// A zero `freq_b` doubles `freq_a` (single-frequency tone).
    pub fn start_tones(&self, freq_a: u16, freq_b: u16) {
        let freq_b = if freq_b == 0 { freq_a } else { freq_b };
        let voices = Voices {
            a: Oscillator::with_step(Oscillator::step_for(freq_a, self.carrier_hz)),
            b: Oscillator::with_step(Oscillator::step_for(freq_b, self.carrier_hz)),
            freq_a,
            freq_b,
        };
        critical_section::with(|cs| {
            self.voices.borrow(cs).set(voices);
            self.tones_on.store(true, Ordering::Release);
        });
    }

    pub fn stop_tones(&self) {
        self.tones_on.store(false, Ordering::Release);
    }

    #[inline]
    pub fn tones_on(&self) -> bool {
        self.tones_on.load(Ordering::Acquire)
    }

    /// Frequencies currently sounding, if any.
    pub fn current_tone(&self) -> Option<(u16, u16)> {
        critical_section::with(|cs| {
            if self.tones_on.load(Ordering::Acquire) {
                let voices = self.voices.borrow(cs).get();
                Some((voices.freq_a, voices.freq_b))
            } else {
                None
            }
        })
    }

    /// Phase steps of the loaded voices.
    pub fn steps(&self) -> (u16, u16) {
        critical_section::with(|cs| {
            let voices = self.voices.borrow(cs).get();
            (voices.a.step(), voices.b.step())
        })
    }

    /// Phases of the loaded voices.
    pub fn phases(&self) -> (u16, u16) {
        critical_section::with(|cs| {
            let voices = self.voices.borrow(cs).get();
            (voices.a.phase(), voices.b.phase())
        })
    }

    #[inline]
    pub fn carrier_hz(&self) -> u32 {
        self.carrier_hz
    }

    #[inline]
    pub fn clock(&self) -> &MillisecondClock {
        &self.clock
    }

    #[inline]
    pub fn long_press(&self) -> &LongPressArbiter {
        &self.long_press
    }

    /// Milliseconds since the carrier started.
    #[inline]
    pub fn uptime_ms(&self) -> u32 {
        self.clock.uptime_ms()
    }
}
