//! Index-width abstraction: an unsigned counter type paired with the
//! atomic cell of the same width.
//!
//! The ring buffer's `head` and `tail` are free-running counters that wrap
//! only at the full range of the index type, never at the capacity. Picking
//! a narrow index (`u8`, `u16`) shrinks the atomic state to what a small
//! microcontroller can load and store in one instruction; `usize` is the
//! right default everywhere else.

use std::sync::atomic::Ordering;
#[cfg(target_pointer_width = "64")]
use std::sync::atomic::AtomicU64;
use std::sync::atomic::{AtomicU16, AtomicU32, AtomicU8, AtomicUsize};

mod sealed {
    pub trait Sealed {}
}

/// Unsigned counter type driving a ring buffer's `head` and `tail`.
///
/// Implemented for `u8`, `u16`, `u32` and `usize` (plus `u64` on 64-bit
/// targets). The trait is sealed: the counter protocol is only sound for
/// unsigned integers no wider than `usize`, and the width check at ring
/// instantiation relies on every implementation honoring that.
pub trait RingIndex: Copy + Eq + sealed::Sealed + 'static {
    /// Atomic cell of the same width as the index.
    type Atomic;

    /// A zero-initialized atomic cell, usable as a `const` initializer.
    const ATOMIC_ZERO: Self::Atomic;

    /// Largest representable index value, widened to `usize`.
    const MAX: usize;

    /// Loads the counter with the given ordering.
    fn load(cell: &Self::Atomic, order: Ordering) -> Self;

    /// Stores the counter with the given ordering.
    fn store(cell: &Self::Atomic, value: Self, order: Ordering);

    /// Widens to `usize`. Lossless: implementations are never wider than
    /// `usize`.
    fn widen(self) -> usize;

    /// Advances the counter by `n`, wrapping at the type's full range.
    fn advance(self, n: usize) -> Self;

    /// Modular distance `self - other`. Exact whenever the live difference
    /// is at most half the type's range, which the capacity check
    /// guarantees for the head/tail pair.
    fn distance(self, other: Self) -> usize;
}

macro_rules! ring_index {
    ($int:ty, $atomic:ty) => {
        impl sealed::Sealed for $int {}

        impl RingIndex for $int {
            type Atomic = $atomic;

            const ATOMIC_ZERO: $atomic = <$atomic>::new(0);

            const MAX: usize = <$int>::MAX as usize;

            #[inline]
            fn load(cell: &$atomic, order: Ordering) -> Self {
                cell.load(order)
            }

            #[inline]
            fn store(cell: &$atomic, value: Self, order: Ordering) {
                cell.store(value, order);
            }

            #[inline]
            fn widen(self) -> usize {
                self as usize
            }

            #[inline]
            fn advance(self, n: usize) -> Self {
                self.wrapping_add(n as $int)
            }

            #[inline]
            fn distance(self, other: Self) -> usize {
                self.wrapping_sub(other) as usize
            }
        }
    };
}

ring_index!(u8, AtomicU8);
ring_index!(u16, AtomicU16);
ring_index!(u32, AtomicU32);
ring_index!(usize, AtomicUsize);
#[cfg(target_pointer_width = "64")]
ring_index!(u64, AtomicU64);
