//! Host simulator for the board and carrier.
//!
//! Time only advances inside `relax()`: every busy-wait spin runs one
//! carrier tick through the engine, exactly as the timer ISR would.

#![allow(dead_code)]

use rust_bluebox::config::nvs::{ImageMirror, NvsError};
use rust_bluebox::hal::{Board, OutputLevel};
use rust_bluebox::memory::{chunk_addr, CHUNK_SIZE, HEADER_MODE_ADDR};
use rust_bluebox::{Bluebox, BlueboxConfig, FaultState, KeyCode, KeypadLayout, ToneEngine};

pub const CARRIER_HZ: u32 = 32_000;

/// Simulated time allowed past the end of the script before giving up
const OVERRUN_MS: u64 = 60_000;

/// One sounded tone as heard on the output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToneEvent {
    pub start_ms: u64,
    pub ms: u16,
    pub a: u16,
    pub b: u16,
}

impl ToneEvent {
    pub fn triple(&self) -> (u16, u16, u16) {
        (self.ms, self.a, self.b)
    }
}

/// ADC reading at the middle of `key`'s band on the standard ladder.
pub fn reading(key: KeyCode) -> u8 {
    let band = KeypadLayout::STANDARD
        .bands()
        .iter()
        .find(|b| b.key == key)
        .expect("every key has a band");
    ((band.above as u16 + band.upto as u16 + 1) / 2) as u8
}

/// Keypad timeline in milliseconds.
#[derive(Default)]
pub struct Script {
    segments: Vec<(u64, u8)>,
    end_ms: u64,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn idle(mut self, ms: u64) -> Self {
        self.segments.push((self.end_ms, 0));
        self.end_ms += ms;
        self
    }

    pub fn press(mut self, key: KeyCode, ms: u64) -> Self {
        self.segments.push((self.end_ms, reading(key)));
        self.end_ms += ms;
        self
    }

    /// Fixed raw reading for `ms`.
    pub fn level(mut self, value: u8, ms: u64) -> Self {
        self.segments.push((self.end_ms, value));
        self.end_ms += ms;
        self
    }

    /// Short press followed by a release gap.
    pub fn tap(self, key: KeyCode) -> Self {
        self.press(key, 150).idle(100)
    }

    fn at(&self, ms: u64) -> u8 {
        if ms >= self.end_ms {
            return 0;
        }
        self.segments
            .iter()
            .rev()
            .find(|(start, _)| *start <= ms)
            .map(|(_, v)| *v)
            .unwrap_or(0)
    }
}

pub struct SimBoard {
    engine: &'static ToneEngine,
    script: Script,
    ticks: u64,
    ticks_per_ms: u64,
    open: Option<(u64, u16, u16)>,
    pub tones: Vec<ToneEvent>,
    pub image: ImageMirror,
    pub fail_writes: bool,
    pub writes: usize,
    pub last_level: u8,
}

impl SimBoard {
    pub fn new(engine: &'static ToneEngine, script: Script) -> Self {
        Self {
            engine,
            script,
            ticks: 0,
            ticks_per_ms: engine.clock().ticks_per_ms() as u64,
            open: None,
            tones: Vec::new(),
            image: ImageMirror::erased(),
            fail_writes: false,
            writes: 0,
            last_level: 0,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.ticks / self.ticks_per_ms
    }

    pub fn set_header(&mut self, mode: u8, length: u8) {
        self.image.write(HEADER_MODE_ADDR, &[mode, length]).unwrap();
    }

    pub fn header(&self) -> [u8; 2] {
        let mut raw = [0u8; 2];
        self.image.read(HEADER_MODE_ADDR, &mut raw).unwrap();
        raw
    }

    pub fn chunk(&self, slot: u8) -> [u8; CHUNK_SIZE] {
        let mut bytes = [0u8; CHUNK_SIZE];
        self.image.read(chunk_addr(slot).unwrap(), &mut bytes).unwrap();
        bytes
    }

    pub fn set_chunk(&mut self, slot: u8, bytes: &[u8]) {
        self.image.write(chunk_addr(slot).unwrap(), bytes).unwrap();
    }

    pub fn tone_triples(&self) -> Vec<(u16, u16, u16)> {
        self.tones.iter().map(ToneEvent::triple).collect()
    }

    pub fn clear_tones(&mut self) {
        self.tones.clear();
    }
}

impl OutputLevel for SimBoard {
    fn set_output_level(&mut self, level: u8) {
        self.last_level = level;
    }
}

impl Board for SimBoard {
    type Error = NvsError;

    fn read_adc(&mut self) -> u8 {
        self.script.at(self.now_ms())
    }

    fn enable_output(&mut self) {
        let (a, b) = self.engine.current_tone().expect("output enabled without a tone");
        self.open = Some((self.ticks, a, b));
    }

    fn disable_output(&mut self) {
        if let Some((start, a, b)) = self.open.take() {
            let elapsed = self.ticks - start;
            let ms = ((elapsed + self.ticks_per_ms - 1) / self.ticks_per_ms) as u16;
            self.tones.push(ToneEvent {
                start_ms: start / self.ticks_per_ms,
                ms,
                a,
                b,
            });
        }
    }

    fn read_persistent(&mut self, addr: usize, buf: &mut [u8]) -> Result<(), NvsError> {
        self.image.read(addr, buf)
    }

    fn write_persistent(&mut self, addr: usize, data: &[u8]) -> Result<(), NvsError> {
        if self.fail_writes {
            return Err(NvsError::NotAvailable);
        }
        self.writes += 1;
        self.image.write(addr, data).map(|_| ())
    }

    fn relax(&mut self) {
        let engine = self.engine;
        engine.on_carrier_tick(self);
        self.ticks += 1;
        if self.now_ms() > self.script.end_ms + OVERRUN_MS {
            panic!("simulation ran {} ms past the end of the script", OVERRUN_MS);
        }
    }
}

pub fn leak_engine() -> &'static ToneEngine {
    Box::leak(Box::new(ToneEngine::new(CARRIER_HZ)))
}

pub fn leak_faults() -> &'static FaultState {
    Box::leak(Box::new(FaultState::new()))
}

/// Bluebox over a fresh simulator with header `[mode, length]`.
pub fn bluebox_with(
    script: Script,
    config: BlueboxConfig,
    setup: impl FnOnce(&mut SimBoard),
) -> Bluebox<'static, SimBoard> {
    let engine = leak_engine();
    let mut board = SimBoard::new(engine, script);
    setup(&mut board);
    Bluebox::new(engine, board, config, leak_faults())
}

pub fn bluebox(script: Script, mode: u8, length: u8) -> Bluebox<'static, SimBoard> {
    bluebox_with(script, BlueboxConfig::DEFAULT, |b| b.set_header(mode, length))
}

pub fn board<'a>(bb: &'a Bluebox<'static, SimBoard>) -> &'a SimBoard {
    bb.synth().board()
}

pub fn board_mut<'a>(bb: &'a mut Bluebox<'static, SimBoard>) -> &'a mut SimBoard {
    bb.synth_mut().board_mut()
}
