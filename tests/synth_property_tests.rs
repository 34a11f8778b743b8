//! Oscillator and engine properties

mod common;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use rust_bluebox::audio::oscillator::{MAX_STEP, PHASE_MODULUS};
use rust_bluebox::audio::{Oscillator, Synth, SILENCE_LEVEL};
use rust_bluebox::hal::OutputLevel;
use rust_bluebox::ToneEngine;

use common::{leak_engine, Script, SimBoard};

#[test]
fn test_phase_stays_in_table() {
    let mut rng = ChaCha8Rng::seed_from_u64(0xB1E_B0C5);

    for _ in 0..500 {
        let step = rng.gen_range(0..=MAX_STEP);
        let ticks = rng.gen_range(0..5000u32);

        let mut osc = Oscillator::with_step(step);
        for _ in 0..ticks {
            osc.advance();
            assert!(osc.phase() < PHASE_MODULUS);
        }

        // Wrap by subtraction is exact modular arithmetic
        let expected = (step as u64 * ticks as u64) % PHASE_MODULUS as u64;
        assert_eq!(osc.phase() as u64, expected, "step {} ticks {}", step, ticks);
    }
}

#[test]
fn test_steps_for_audio_band_are_wrappable() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for _ in 0..1000 {
        let freq = rng.gen_range(1..=20_000u16);
        let carrier = rng.gen_range(8_000..=80_000u32);
        assert!(Oscillator::step_for(freq, carrier) <= MAX_STEP);
    }
}

struct Levels(Vec<u8>);

impl OutputLevel for Levels {
    fn set_output_level(&mut self, level: u8) {
        self.0.push(level);
    }
}

#[test]
fn test_engine_frequency_by_zero_crossings() {
    // 1000 Hz at 32 kHz: 32 samples per cycle, two midpoint crossings each
    let engine = ToneEngine::new(32_000);
    engine.start_tones(1000, 1000);
    let mut levels = Levels(Vec::new());
    for _ in 0..32_000 {
        engine.on_carrier_tick(&mut levels);
    }
    let rising = levels
        .0
        .windows(2)
        .filter(|w| w[0] < SILENCE_LEVEL && w[1] >= SILENCE_LEVEL)
        .count();
    assert!((999..=1001).contains(&rising), "rising crossings {}", rising);
}

#[test]
fn test_play_blocks_for_duration_and_silences_after() {
    let engine = leak_engine();
    let mut synth = Synth::new(engine, SimBoard::new(engine, Script::new().idle(1000)));

    synth.play(75, 900, 1300);
    assert!(!engine.tones_on());
    assert_eq!(synth.board().tone_triples(), vec![(75, 900, 1300)]);

    synth.sleep_ms(5);
    assert_eq!(synth.board().last_level, SILENCE_LEVEL);
    assert_eq!(synth.board().now_ms(), 80);
}

#[test]
fn test_zero_second_frequency_plays_single_tone() {
    let engine = leak_engine();
    let mut synth = Synth::new(engine, SimBoard::new(engine, Script::new().idle(1000)));
    synth.play(10, 2600, 0);
    assert_eq!(synth.board().tone_triples(), vec![(10, 2600, 2600)]);
}

#[test]
fn test_zero_duration_still_brackets_output() {
    let engine = leak_engine();
    let mut synth = Synth::new(engine, SimBoard::new(engine, Script::new().idle(1000)));

    synth.play(0, 700, 900);
    assert_eq!(synth.board().tone_triples(), vec![(0, 700, 900)]);
    assert!(!engine.tones_on());
    assert_eq!(synth.board().now_ms(), 0);
}
