//! Hardware Abstraction Layer for RustBluebox.
//!
//! Thin seams around the peripherals the firmware touches.
//! Business logic stays in core modules, HAL is just I/O.
//!
//! Two sides, matching the two execution contexts:
//! - [`OutputLevel`]: written from the carrier ISR, once per tick
//! - [`Board`]: owned by the control loop (ADC, amplifier, storage)

/// PWM duty sink driven by the carrier ISR.
pub trait OutputLevel {
    /// Set the 8-bit duty for the current carrier period.
    fn set_output_level(&mut self, level: u8);
}

/// Peripherals used by the control loop.
pub trait Board {
    /// Storage failure detail.
    type Error: core::fmt::Debug;

    /// One 8-bit conversion of the keypad ladder. Blocks until complete.
    fn read_adc(&mut self) -> u8;

    /// Connect the tone output (amplifier on).
    fn enable_output(&mut self);

    /// Disconnect the tone output (amplifier off).
    fn disable_output(&mut self);

    /// Read `buf.len()` bytes of the persistent image starting at `addr`.
    fn read_persistent(&mut self, addr: usize, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Write `data` to the persistent image at `addr`. Returns once durable.
    fn write_persistent(&mut self, addr: usize, data: &[u8]) -> Result<(), Self::Error>;

    /// Called on every spin of a busy-wait.
    ///
    /// Hardware yields the pipeline; the host simulator advances the carrier.
    fn relax(&mut self) {
        core::hint::spin_loop();
    }
}
