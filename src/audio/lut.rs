//! Sine wave lookup table for tone synthesis
//!
//! 256-entry table covering one full cycle.
//! Values are unsigned 7-bit (0..=126) so two voices summed fit an 8-bit PWM duty.

/// Number of entries in the sine LUT
pub const LUT_SIZE: usize = 256;

/// Table value that represents zero signal
pub const SINE_MIDPOINT: u8 = 63;

/// Largest table value (positive peak)
pub const SINE_PEAK: u8 = 2 * SINE_MIDPOINT;

/// PWM level for silence with two voices summed
pub const SILENCE_LEVEL: u8 = 2 * SINE_MIDPOINT;

/// Pre-computed sine wave lookup table
///
/// Index 0 = 0°, 64 = 90°, 128 = 180°, 192 = 270°
/// Built from one quarter wave, so `SINE_LUT[i] + SINE_LUT[i + 128] == SINE_PEAK`.
pub static SINE_LUT: [u8; LUT_SIZE] = {
    const QUARTER: usize = LUT_SIZE / 4;

    // Offsets above the midpoint for 0..=90°
    let mut quarter = [0u8; QUARTER + 1];
    let mut i = 0;
    while i <= QUARTER {
        let angle = (i as f64) * core::f64::consts::PI * 2.0 / (LUT_SIZE as f64);
        quarter[i] = (const_sin(angle) * SINE_MIDPOINT as f64 + 0.5) as u8;
        i += 1;
    }

    let mut table = [0u8; LUT_SIZE];
    let mut i = 0;
    while i < LUT_SIZE {
        table[i] = if i <= QUARTER {
            SINE_MIDPOINT + quarter[i]
        } else if i < 2 * QUARTER {
            SINE_MIDPOINT + quarter[2 * QUARTER - i]
        } else if i <= 3 * QUARTER {
            SINE_MIDPOINT - quarter[i - 2 * QUARTER]
        } else {
            SINE_MIDPOINT - quarter[LUT_SIZE - i]
        };
        i += 1;
    }
    table
};

/// Const-compatible sine for 0..=π/2 (Taylor series)
const fn const_sin(x: f64) -> f64 {
    // sin(x) = x - x³/3! + x⁵/5! - x⁷/7! + x⁹/9!
    let x2 = x * x;
    let x3 = x2 * x;
    let x5 = x3 * x2;
    let x7 = x5 * x2;
    let x9 = x7 * x2;

    x - x3 / 6.0 + x5 / 120.0 - x7 / 5040.0 + x9 / 362880.0
}
