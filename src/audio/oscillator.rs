//! Phase-accumulator oscillator
//!
//! Fixed-point phase: the top 8 bits index [`SINE_LUT`], the low
//! [`PHASE_FRAC_BITS`] bits carry the fraction. Wrap is a conditional
//! subtraction, no division on the tick path.

use super::lut::{LUT_SIZE, SINE_LUT};

/// Fractional bits below the table index
pub const PHASE_FRAC_BITS: u32 = 6;

/// One full cycle in accumulator units (table length, scaled)
pub const PHASE_MODULUS: u16 = (LUT_SIZE as u16) << PHASE_FRAC_BITS;

/// Largest step a single conditional subtraction can wrap
pub const MAX_STEP: u16 = PHASE_MODULUS - 1;

/// One voice of the tone generator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Oscillator {
    /// Invariant: `phase < PHASE_MODULUS`
    phase: u16,
    /// Phase increment per carrier tick
    step: u16,
}

impl Oscillator {
    /// Silent voice (step 0, parked at phase 0).
    pub const IDLE: Self = Self { phase: 0, step: 0 };

    /// New voice at phase 0. Steps above [`MAX_STEP`] are clamped.
    #[inline]
    pub const fn with_step(step: u16) -> Self {
        Self {
            phase: 0,
            step: if step > MAX_STEP { MAX_STEP } else { step },
        }
    }

    /// Calculate phase step for a frequency at the given carrier rate
    ///
    /// step = round(PHASE_MODULUS * freq / carrier)
    #[inline]
    pub fn step_for(freq_hz: u16, carrier_hz: u32) -> u16 {
        let carrier = carrier_hz.max(1) as u64;
        let step = (PHASE_MODULUS as u64 * freq_hz as u64 + carrier / 2) / carrier;
        step.min(MAX_STEP as u64) as u16
    }

    /// Table sample at the current phase.
    #[inline]
    pub fn sample(&self) -> u8 {
        SINE_LUT[(self.phase >> PHASE_FRAC_BITS) as usize]
    }

    /// Advance one carrier tick.
    #[inline]
    pub fn advance(&mut self) {
        self.phase += self.step;
        if self.phase >= PHASE_MODULUS {
            self.phase -= PHASE_MODULUS;
        }
    }

    #[inline]
    pub fn phase(&self) -> u16 {
        self.phase
    }

    #[inline]
    pub fn step(&self) -> u16 {
        self.step
    }
}
