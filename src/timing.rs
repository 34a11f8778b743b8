//! Module: timing
//!
//! Purpose: Millisecond time base and long-press countdown, both driven by
//! the carrier ISR.
//!
//! Architecture:
//! - `MillisecondClock`: divides carrier ticks down to 1 ms, raises a
//!   one-shot flag per millisecond and keeps an uptime counter
//! - `LongPressArbiter`: armed by the control loop, decremented once per
//!   millisecond by the ISR, raises its own flag on expiry and reloads
//!
//! Safety: Lock-free. The ISR is the only writer of countdowns; the control
//! loop arms/disarms inside a critical section so the ISR never sees a
//! half-armed arbiter.

use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, AtomicU8, Ordering};

/// Carrier ticks per millisecond, clamped to what the 8-bit divider holds.
pub const fn ticks_per_ms(carrier_hz: u32) -> u8 {
    let k = carrier_hz / 1000;
    if k == 0 {
        1
    } else if k > u8::MAX as u32 {
        u8::MAX
    } else {
        k as u8
    }
}

/// Divide-by-K millisecond source.
///
/// The flag is a bool, not a counter: a consumer that falls more than one
/// millisecond behind loses the extra edges.
pub struct MillisecondClock {
    reload: u8,
    countdown: AtomicU8,
    flag: AtomicBool,
    uptime_ms: AtomicU32,
}

impl MillisecondClock {
    pub const fn new(carrier_hz: u32) -> Self {
        let reload = ticks_per_ms(carrier_hz);
        Self {
            reload,
            countdown: AtomicU8::new(reload),
            flag: AtomicBool::new(false),
            uptime_ms: AtomicU32::new(0),
        }
    }

    /// Count one carrier tick (ISR). Returns `true` on a millisecond boundary.
    #[inline]
    pub fn tick(&self) -> bool {
        let remaining = self.countdown.load(Ordering::Relaxed);
        if remaining <= 1 {
            self.countdown.store(self.reload, Ordering::Relaxed);
            self.uptime_ms.fetch_add(1, Ordering::Relaxed);
            self.flag.store(true, Ordering::Release);
            true
        } else {
            self.countdown.store(remaining - 1, Ordering::Relaxed);
            false
        }
    }

    /// Consume the millisecond flag if it is raised.
    #[inline]
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::AcqRel)
    }

    #[inline]
    pub fn uptime_ms(&self) -> u32 {
        self.uptime_ms.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn ticks_per_ms(&self) -> u8 {
        self.reload
    }
}

/// Long-press countdown.
///
/// While armed the ISR decrements it once per millisecond; on reaching zero
/// it reloads with the threshold and raises the flag, so a key held through
/// several thresholds fires repeatedly.
pub struct LongPressArbiter {
    armed: AtomicBool,
    threshold_ms: AtomicU16,
    countdown: AtomicU16,
    flag: AtomicBool,
}

impl LongPressArbiter {
    pub const fn new() -> Self {
        Self {
            armed: AtomicBool::new(false),
            threshold_ms: AtomicU16::new(0),
            countdown: AtomicU16::new(0),
            flag: AtomicBool::new(false),
        }
    }

    /// Start counting from `threshold_ms` with the flag cleared.
    pub fn arm(&self, threshold_ms: u16) {
        let threshold = threshold_ms.max(1);
        critical_section::with(|_| {
            self.threshold_ms.store(threshold, Ordering::Relaxed);
            self.countdown.store(threshold, Ordering::Relaxed);
            self.flag.store(false, Ordering::Relaxed);
            self.armed.store(true, Ordering::Release);
        });
    }

    /// Stop counting and clear the flag.
    pub fn disarm(&self) {
        critical_section::with(|_| {
            self.armed.store(false, Ordering::Release);
            self.flag.store(false, Ordering::Relaxed);
        });
    }

    /// One millisecond elapsed (ISR).
    #[inline]
    pub fn on_millisecond(&self) {
        if !self.armed.load(Ordering::Acquire) {
            return;
        }
        let remaining = self.countdown.load(Ordering::Relaxed);
        if remaining <= 1 {
            self.countdown
                .store(self.threshold_ms.load(Ordering::Relaxed), Ordering::Relaxed);
            self.flag.store(true, Ordering::Release);
        } else {
            self.countdown.store(remaining - 1, Ordering::Relaxed);
        }
    }

    /// Consume the long-press flag if it is raised.
    #[inline]
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::AcqRel)
    }

    #[inline]
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }
}

impl Default for LongPressArbiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_per_ms_clamp() {
        assert_eq!(ticks_per_ms(32_000), 32);
        assert_eq!(ticks_per_ms(78_125), 78);
        assert_eq!(ticks_per_ms(500), 1);
        assert_eq!(ticks_per_ms(1_000_000), 255);
    }

    #[test]
    fn test_clock_divides_by_k() {
        let clock = MillisecondClock::new(4000);
        let boundaries = (0..20).filter(|_| clock.tick()).count();
        assert_eq!(boundaries, 5);
        assert_eq!(clock.uptime_ms(), 5);
    }

    #[test]
    fn test_clock_flag_is_not_a_counter() {
        let clock = MillisecondClock::new(2000);
        for _ in 0..10 {
            clock.tick();
        }
        assert!(clock.take());
        assert!(!clock.take());
    }

    #[test]
    fn test_longpress_fires_and_reloads() {
        let lp = LongPressArbiter::new();
        lp.arm(3);
        lp.on_millisecond();
        lp.on_millisecond();
        assert!(!lp.take());
        lp.on_millisecond();
        assert!(lp.take());
        for _ in 0..3 {
            lp.on_millisecond();
        }
        assert!(lp.take());
    }

    #[test]
    fn test_longpress_idle_when_disarmed() {
        let lp = LongPressArbiter::new();
        for _ in 0..100 {
            lp.on_millisecond();
        }
        assert!(!lp.take());

        lp.arm(2);
        lp.on_millisecond();
        lp.on_millisecond();
        lp.disarm();
        assert!(!lp.take());
        assert!(!lp.is_armed());
    }

    #[test]
    fn test_rearm_restarts_countdown() {
        let lp = LongPressArbiter::new();
        lp.arm(4);
        lp.on_millisecond();
        lp.on_millisecond();
        lp.on_millisecond();
        lp.arm(4);
        lp.on_millisecond();
        assert!(!lp.take());
    }
}
