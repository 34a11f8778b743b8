//! Control-loop handle on the tone engine.
//!
//! Owns the [`Board`] and exposes the blocking primitives everything above
//! it is built from: `sleep_ms` and `play`.

use super::engine::ToneEngine;
use crate::dispatch::ToneSink;
use crate::hal::Board;

pub struct Synth<'e, B: Board> {
    engine: &'e ToneEngine,
    board: B,
}

impl<'e, B: Board> Synth<'e, B> {
    pub fn new(engine: &'e ToneEngine, board: B) -> Self {
        Self { engine, board }
    }

    /// Busy-wait for `ms` millisecond flags from the ISR.
    pub fn sleep_ms(&mut self, ms: u16) {
        let clock = self.engine.clock();
        for _ in 0..ms {
            while !clock.take() {
                self.board.relax();
            }
        }
    }

    /// Sound `freq_a` + `freq_b` for `duration_ms`, blocking.
    ///
    /// `freq_b == 0` plays `freq_a` alone.
    pub fn play(&mut self, duration_ms: u16, freq_a: u16, freq_b: u16) {
        self.engine.start_tones(freq_a, freq_b);
        self.board.enable_output();
        self.sleep_ms(duration_ms);
        self.engine.stop_tones();
        self.board.disable_output();
    }

    #[inline]
    pub fn engine(&self) -> &'e ToneEngine {
        self.engine
    }

    #[inline]
    pub fn board(&self) -> &B {
        &self.board
    }

    #[inline]
    pub fn board_mut(&mut self) -> &mut B {
        &mut self.board
    }

    /// Milliseconds since the carrier started.
    #[inline]
    pub fn now_ms(&self) -> u32 {
        self.engine.uptime_ms()
    }
}

impl<B: Board> ToneSink for Synth<'_, B> {
    fn play(&mut self, duration_ms: u16, freq_a: u16, freq_b: u16) {
        Synth::play(self, duration_ms, freq_a, freq_b);
    }

    fn pause(&mut self, ms: u16) {
        self.sleep_ms(ms);
    }
}
