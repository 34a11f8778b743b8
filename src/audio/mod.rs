//! Dual-tone synthesis for the PWM output
//!
//! Architecture:
//! - 256-entry 7-bit sine LUT, two phase accumulators summed per tick
//! - `ToneEngine`: state shared with the carrier ISR (voices, flags)
//! - `Synth`: control-loop side, blocking `play`/`sleep_ms` over a `Board`

pub mod lut;
pub mod oscillator;
pub mod engine;
pub mod synth;

pub use lut::{SINE_LUT, LUT_SIZE, SILENCE_LEVEL};
pub use oscillator::Oscillator;
pub use engine::ToneEngine;
pub use synth::Synth;
