//! Keystroke history ring
//!
//! FIFO of key codes recorded by short presses and drained into a memory
//! chunk on store. Capacity is the chunk payload size.
//!
//! Every operation runs inside a critical section, so the ring is safe to
//! share with interrupt context even though only the control loop drives it.
//! Overflow drops the oldest entry.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::memory::CHUNK_KEYS;

/// Ring sized to one memory chunk
pub type KeyHistory = KeyRing<CHUNK_KEYS>;

struct RingState<const N: usize> {
    buffer: [u8; N],
    head: usize,
    count: usize,
}

impl<const N: usize> RingState<N> {
    const EMPTY: Self = Self {
        buffer: [0u8; N],
        head: 0,
        count: 0,
    };
}

pub struct KeyRing<const N: usize> {
    state: Mutex<RefCell<RingState<N>>>,
}

impl<const N: usize> KeyRing<N> {
    /// Create new empty ring
    pub const fn new() -> Self {
        const { assert!(N > 0, "Ring capacity must be non-zero") };

        Self {
            state: Mutex::new(RefCell::new(RingState::EMPTY)),
        }
    }

    /// Discard all entries.
    pub fn init(&self) {
        critical_section::with(|cs| {
            let mut s = self.state.borrow_ref_mut(cs);
            s.head = 0;
            s.count = 0;
        });
    }

    /// Append a key code
    ///
    /// If the ring is full the oldest entry is overwritten; returns `true`
    /// when that happened.
    pub fn insert(&self, code: u8) -> bool {
        critical_section::with(|cs| {
            let mut s = self.state.borrow_ref_mut(cs);
            let tail = (s.head + s.count) % N;
            s.buffer[tail] = code;
            if s.count == N {
                s.head = (s.head + 1) % N;
                true
            } else {
                s.count += 1;
                false
            }
        })
    }

    /// Take the oldest key code
    ///
    /// Returns None if the ring is empty.
    pub fn remove(&self) -> Option<u8> {
        critical_section::with(|cs| {
            let mut s = self.state.borrow_ref_mut(cs);
            if s.count == 0 {
                return None;
            }
            let code = s.buffer[s.head];
            s.head = (s.head + 1) % N;
            s.count -= 1;
            Some(code)
        })
    }

    #[inline]
    pub fn count(&self) -> usize {
        critical_section::with(|cs| self.state.borrow_ref(cs).count)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Copy entries oldest-first into `out` without removing them.
    ///
    /// Returns number of entries copied.
    pub fn peek_into(&self, out: &mut [u8]) -> usize {
        critical_section::with(|cs| {
            let s = self.state.borrow_ref(cs);
            let n = s.count.min(out.len());
            for (i, slot) in out.iter_mut().take(n).enumerate() {
                *slot = s.buffer[(s.head + i) % N];
            }
            n
        })
    }
}

impl<const N: usize> Default for KeyRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let ring: KeyRing<4> = KeyRing::new();
        ring.insert(1);
        ring.insert(2);
        ring.insert(3);
        assert_eq!(ring.count(), 3);
        assert_eq!(ring.remove(), Some(1));
        assert_eq!(ring.remove(), Some(2));
        assert_eq!(ring.remove(), Some(3));
        assert_eq!(ring.remove(), None);
        assert!(ring.is_empty());
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let ring: KeyRing<3> = KeyRing::new();
        assert!(!ring.insert(1));
        assert!(!ring.insert(2));
        assert!(!ring.insert(3));
        assert!(ring.insert(4));
        assert!(ring.insert(5));
        assert_eq!(ring.count(), 3);

        let mut out = [0u8; 3];
        assert_eq!(ring.peek_into(&mut out), 3);
        assert_eq!(out, [3, 4, 5]);
        assert_eq!(ring.remove(), Some(3));
        assert_eq!(ring.count(), 2);
    }

    #[test]
    fn test_wraparound_keeps_bookkeeping() {
        let ring: KeyRing<4> = KeyRing::new();
        for round in 0..10u8 {
            ring.insert(round);
            ring.insert(round + 100);
            assert_eq!(ring.remove(), Some(round));
            assert_eq!(ring.remove(), Some(round + 100));
            assert!(ring.is_empty());
        }
    }

    #[test]
    fn test_init_discards() {
        let ring: KeyHistory = KeyRing::new();
        for k in 1..=12 {
            ring.insert(k);
        }
        ring.init();
        assert!(ring.is_empty());
        assert_eq!(ring.remove(), None);
        assert_eq!(ring.capacity(), 40);
    }
}
