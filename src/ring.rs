use crate::index::RingIndex;
use crate::invariants::{debug_assert_gap_bounded, debug_assert_within_published};
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::ptr;
use std::sync::atomic::{compiler_fence, Ordering};

// =============================================================================
// MEMORY ORDERING & SYNCHRONIZATION STRATEGY
// =============================================================================
//
// The ring uses the classic SPSC counter protocol. `head` and `tail` are
// free-running counters of the index type `I`; they are reduced modulo the
// capacity only when a slot is addressed, never in the full/empty test.
//
// **Producer (write path):**
// 1. Load `head` with Relaxed (only the producer writes head)
// 2. Load `tail` with Acquire (synchronizes with the consumer's Release,
//    proving the slots below `tail` are free for reuse)
// 3. Write the slot(s) (no ordering needed, protected by the protocol)
// 4. Store `head` with Release (publishes the writes to the consumer)
//
// **Consumer (read path):**
// 1. Load `tail` with Relaxed (only the consumer writes tail)
// 2. Load `head` with Acquire (synchronizes with the producer's Release,
//    proving the slots below `head` are initialized)
// 3. Read the slot(s)
// 4. Store `tail` with Release (returns the slots to the producer)
//
// **Full vs. empty:** the counters are never reduced modulo the capacity, so
// `head - tail` (modular subtraction) is the exact element count in
// `[0, N]`. Full is a distance of `N`, empty a distance of `0`; no slot is
// sacrificed for the distinction. This requires `N <= MAX(I) / 2` so the
// live difference never crosses the representable midpoint, which `new()`
// enforces at compile time.
//
// **FAKE_TSO:** on total-store-ordering hardware (single-core
// microcontrollers, interrupt/DMA pairs on one core) the hardware barriers
// are pure overhead. With `FAKE_TSO = true` every Acquire load degrades to
// a Relaxed load followed by `compiler_fence(Acquire)` and every Release
// store to `compiler_fence(Release)` followed by a Relaxed store. The
// fences keep the compiler from reordering slot accesses across the counter
// operations; the hardware provides the rest.
//
// =============================================================================

/// Compile-time validation of the capacity / index-type pairing.
const fn assert_valid_geometry<I: RingIndex, const N: usize>() {
    assert!(N >= 2, "ring capacity must be at least 2");
    assert!(N.is_power_of_two(), "ring capacity must be a power of two");
    assert!(
        std::mem::size_of::<I>() <= std::mem::size_of::<usize>(),
        "ring index type must not be wider than usize"
    );
    assert!(
        N <= I::MAX >> 1,
        "ring capacity must not exceed half the index type's range"
    );
}

/// Wrapper type that ensures 128-byte alignment to prevent prefetcher-induced
/// false sharing on Intel/AMD CPUs (which may prefetch adjacent cache lines).
#[repr(C)]
#[repr(align(128))]
struct CacheAligned<T> {
    value: T,
}

impl<T> CacheAligned<T> {
    const fn new(value: T) -> Self {
        Self { value }
    }
}

impl<T> std::ops::Deref for CacheAligned<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

/// A bounded, lock-free, wait-free SPSC ring buffer.
///
/// Exactly one thread (or interrupt context) may hold the producer role and
/// exactly one the consumer role at any time; use [`RingBuffer::split`] to
/// have the compiler enforce that, or call the role methods directly and
/// uphold the contract yourself. Every operation completes in a bounded
/// number of steps; nothing blocks, spins or retries internally.
///
/// # Type Parameters
///
/// - `T`: element type; must be trivially copyable (`Copy`)
/// - `N`: capacity; a power of two, at least 2
/// - `I`: unsigned counter type (`u8`, `u16`, `u32`, `usize`, `u64` on
///   64-bit targets) with `N <= I::MAX / 2`
/// - `FAKE_TSO`: erase hardware barriers, keeping compiler fences only
///
/// # Memory Layout
///
/// `head`, `tail` and the slot array each start on their own 128-byte
/// aligned region, so a producer-side counter store never bounces the cache
/// line the consumer is polling (and vice versa).
///
/// The buffer must outlive all operations on it; it is not `Clone`, and
/// moving it is only possible while no borrow (and therefore no operation)
/// is live.
#[repr(C)]
pub struct RingBuffer<T, const N: usize, I: RingIndex = usize, const FAKE_TSO: bool = false> {
    /// Write counter (written by producer, read by consumer).
    head: CacheAligned<I::Atomic>,
    /// Read counter (written by consumer, read by producer).
    tail: CacheAligned<I::Atomic>,
    /// Slot storage. The counter discipline grants each slot to exactly one
    /// side at a time, so cells are accessed without further synchronization.
    slots: CacheAligned<[UnsafeCell<MaybeUninit<T>>; N]>,
}

// Safety: the SPSC discipline gives each slot exactly one accessor at a
// time, and counter publication uses release/acquire (or fenced relaxed
// stores under FAKE_TSO). `T: Send` because values cross threads; `T: Copy`
// keeps slot reuse free of destruction obligations.
unsafe impl<T: Send + Copy, const N: usize, I: RingIndex, const FAKE_TSO: bool> Send
    for RingBuffer<T, N, I, FAKE_TSO>
{
}
unsafe impl<T: Send + Copy, const N: usize, I: RingIndex, const FAKE_TSO: bool> Sync
    for RingBuffer<T, N, I, FAKE_TSO>
{
}

impl<T: Copy, const N: usize, I: RingIndex, const FAKE_TSO: bool> RingBuffer<T, N, I, FAKE_TSO> {
    /// The mask for slot addressing: `N - 1` (works because N is a power of 2).
    const MASK: usize = N - 1;

    /// Creates an empty ring buffer.
    ///
    /// The capacity / index-type pairing is validated at compile time for
    /// every instantiation: `RingBuffer::<u32, 3>::new()` or
    /// `RingBuffer::<u32, 256, u8>::new()` fail to build.
    pub const fn new() -> Self {
        const { assert_valid_geometry::<I, N>() };

        Self {
            head: CacheAligned::new(I::ATOMIC_ZERO),
            tail: CacheAligned::new(I::ATOMIC_ZERO),
            // SAFETY: an array of UnsafeCell<MaybeUninit<T>> does not require
            // initialization; this is the standard const-init pattern.
            slots: CacheAligned::new(unsafe { MaybeUninit::uninit().assume_init() }),
        }
    }

    // -------------------------------------------------------------------------
    // ORDERING PRIMITIVES
    // -------------------------------------------------------------------------

    /// Acquire-load of a counter; under `FAKE_TSO` a relaxed load followed
    /// by a compiler fence.
    #[inline]
    fn load_acquire(cell: &I::Atomic) -> I {
        if FAKE_TSO {
            let value = I::load(cell, Ordering::Relaxed);
            compiler_fence(Ordering::Acquire);
            value
        } else {
            I::load(cell, Ordering::Acquire)
        }
    }

    /// Release-store of a counter; under `FAKE_TSO` a compiler fence
    /// followed by a relaxed store.
    #[inline]
    fn store_release(cell: &I::Atomic, value: I) {
        if FAKE_TSO {
            compiler_fence(Ordering::Release);
            I::store(cell, value, Ordering::Relaxed);
        } else {
            I::store(cell, value, Ordering::Release);
        }
    }

    /// Raw pointer to the slot a counter value addresses.
    #[inline]
    fn slot_ptr(&self, at: I) -> *mut T {
        self.slots[at.widen() & Self::MASK].get().cast::<T>()
    }

    /// Raw pointer to the slot at a masked offset.
    #[inline]
    fn slot_ptr_at(&self, offset: usize) -> *mut T {
        self.slots[offset].get().cast::<T>()
    }

    // -------------------------------------------------------------------------
    // QUERY SURFACE
    // -------------------------------------------------------------------------

    /// Returns the capacity.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of pending elements.
    ///
    /// Safe from either role, but a racy snapshot: from the consumer's view
    /// it is a lower bound on what the next pop will find.
    #[inline]
    pub fn len(&self) -> usize {
        let head = Self::load_acquire(&self.head);
        let tail = I::load(&self.tail, Ordering::Relaxed);
        head.distance(tail)
    }

    /// Number of free slots.
    ///
    /// From the producer's view a lower bound on what the next push will
    /// find.
    #[inline]
    pub fn available(&self) -> usize {
        let head = I::load(&self.head, Ordering::Relaxed);
        let tail = Self::load_acquire(&self.tail);
        N - head.distance(tail)
    }

    /// Returns true if no elements are pending.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if no slot is free.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.available() == 0
    }

    // -------------------------------------------------------------------------
    // PRODUCER OPERATIONS
    // -------------------------------------------------------------------------

    /// Appends one element. Returns `false` (and publishes nothing) if the
    /// buffer is full.
    ///
    /// Producer role only.
    #[inline]
    pub fn push(&self, value: T) -> bool {
        let head = I::load(&self.head, Ordering::Relaxed);
        let tail = Self::load_acquire(&self.tail);
        if head.distance(tail) == N {
            return false;
        }

        // SAFETY: head - tail < N, so the slot addressed by `head` has been
        // released by the consumer (acquire load above); the producer is the
        // sole writer of that slot until the release store publishes it.
        unsafe { self.slot_ptr(head).write(value) };

        debug_assert_gap_bounded!(head.advance(1).distance(tail), N);
        Self::store_release(&self.head, head.advance(1));
        true
    }

    /// As [`push`](Self::push), but the payload is produced by `f` only
    /// after the space check succeeds.
    ///
    /// `f` is never invoked on a full buffer, so a closure that consumes a
    /// limited resource (say, pops another queue) fires iff the element
    /// actually lands. `f` runs on the producer thread and must not call
    /// back into the consumer role.
    #[inline]
    pub fn push_with<F>(&self, f: F) -> bool
    where
        F: FnOnce() -> T,
    {
        let head = I::load(&self.head, Ordering::Relaxed);
        let tail = Self::load_acquire(&self.tail);
        if head.distance(tail) == N {
            return false;
        }

        // SAFETY: as in `push`; the slot is producer-owned until published.
        unsafe { self.slot_ptr(head).write(f()) };

        debug_assert_gap_bounded!(head.advance(1).distance(tail), N);
        Self::store_release(&self.head, head.advance(1));
        true
    }

    /// Copies elements out of `src` until all are written or the buffer is
    /// full. Returns the number written, in `[0, src.len()]`; zero means
    /// the buffer was full throughout.
    ///
    /// Each lap copies at most two contiguous runs (the copy is split at
    /// the wraparound boundary) and publishes them together with a single
    /// release store. Producer role only.
    pub fn push_slice(&self, src: &[T]) -> usize {
        self.push_slice_with(src, |_| {})
    }

    /// As [`push_slice`](Self::push_slice), invoking `notify(k)` after each
    /// release store that published `k` elements.
    ///
    /// The callback runs on the producer thread and can wake a waiting
    /// consumer after every incremental publication; it cannot abort the
    /// loop, and it must not call back into the consumer role.
    pub fn push_slice_with<F>(&self, src: &[T], mut notify: F) -> usize
    where
        F: FnMut(usize),
    {
        let mut head = I::load(&self.head, Ordering::Relaxed);
        let mut written = 0;

        while written < src.len() {
            // Re-read the consumer's progress each lap: space freed while
            // copying lets a single call complete a request larger than the
            // momentary free space.
            let tail = Self::load_acquire(&self.tail);
            let space = N - head.distance(tail);
            if space == 0 {
                break;
            }

            let run = (src.len() - written).min(space);
            let offset = head.widen() & Self::MASK;
            let first = run.min(N - offset);

            // SAFETY: `space` slots starting at `offset` were released by
            // the consumer (acquire load above) and are producer-owned until
            // the release store. The copy is split so neither run crosses
            // the wraparound boundary, and `src` is caller memory that
            // cannot alias the slot array.
            unsafe {
                ptr::copy_nonoverlapping(src.as_ptr().add(written), self.slot_ptr_at(offset), first);
                if run > first {
                    ptr::copy_nonoverlapping(
                        src.as_ptr().add(written + first),
                        self.slot_ptr_at(0),
                        run - first,
                    );
                }
            }

            head = head.advance(run);
            debug_assert_gap_bounded!(head.distance(tail), N);
            Self::store_release(&self.head, head);
            written += run;
            notify(run);
        }

        written
    }

    /// Producer-side reset: discards every pending element by rewinding
    /// `head` to the consumer's position.
    ///
    /// Mutates only the producer-owned counter, so it cannot race the
    /// consumer's release store. A concurrent consumer may observe the
    /// transition at any instant. Producer role only.
    #[inline]
    pub fn producer_clear(&self) {
        let tail = I::load(&self.tail, Ordering::Relaxed);
        I::store(&self.head, tail, Ordering::Relaxed);
    }

    // -------------------------------------------------------------------------
    // CONSUMER OPERATIONS
    // -------------------------------------------------------------------------

    /// Removes and returns the front element, or `None` if empty.
    ///
    /// Consumer role only.
    #[inline]
    pub fn pop(&self) -> Option<T> {
        let tail = I::load(&self.tail, Ordering::Relaxed);
        let head = Self::load_acquire(&self.head);
        if tail == head {
            return None;
        }

        // SAFETY: tail != head, so the slot addressed by `tail` holds a
        // value published by the producer's release store; the acquire load
        // above synchronizes with it.
        let value = unsafe { self.slot_ptr(tail).read() };

        Self::store_release(&self.tail, tail.advance(1));
        Some(value)
    }

    /// Returns the front element without consuming it, or `None` if empty.
    ///
    /// The reference is valid only until the next operation by either role:
    /// advancing `tail` returns the slot to the producer, which may then
    /// overwrite it. Do not hold it across any other call. Consumer role
    /// only.
    #[inline]
    pub fn peek(&self) -> Option<&T> {
        let tail = I::load(&self.tail, Ordering::Relaxed);
        let head = Self::load_acquire(&self.head);
        if tail == head {
            return None;
        }

        // SAFETY: as in `pop`; the slot stays consumer-owned until `tail`
        // advances, which this call does not do.
        Some(unsafe { &*self.slot_ptr(tail) })
    }

    /// Returns the `i`-th pending element from the front (0-based), or
    /// `None` if fewer than `i + 1` elements are pending.
    ///
    /// The same aliasing rule as [`peek`](Self::peek) applies. Consumer
    /// role only.
    #[inline]
    pub fn get(&self, i: usize) -> Option<&T> {
        let tail = I::load(&self.tail, Ordering::Relaxed);
        let head = Self::load_acquire(&self.head);
        if i >= head.distance(tail) {
            return None;
        }

        // SAFETY: i < head - tail, so the slot is inside the published
        // window and consumer-owned.
        Some(unsafe { &*self.slot_ptr(tail.advance(i)) })
    }

    /// Unchecked [`get`](Self::get): no emptiness or bounds test.
    ///
    /// # Safety
    ///
    /// `i` must be less than [`len`](Self::len), and the reference must not
    /// be held across any other operation on the buffer.
    #[inline]
    pub unsafe fn get_unchecked(&self, i: usize) -> &T {
        let tail = I::load(&self.tail, Ordering::Relaxed);
        debug_assert_within_published!(i, Self::load_acquire(&self.head).distance(tail));
        &*self.slot_ptr(tail.advance(i))
    }

    /// Discards up to `n` pending elements from the front; returns the
    /// number discarded, which is `min(n, len())`.
    ///
    /// Consumer role only.
    #[inline]
    pub fn discard(&self, n: usize) -> usize {
        let tail = I::load(&self.tail, Ordering::Relaxed);
        let head = Self::load_acquire(&self.head);
        let dropped = n.min(head.distance(tail));
        if dropped > 0 {
            Self::store_release(&self.tail, tail.advance(dropped));
        }
        dropped
    }

    /// Copies elements into `dst` until it is filled or the buffer is
    /// empty. Returns the number read, in `[0, dst.len()]`; zero means the
    /// buffer was empty throughout.
    ///
    /// Consumer role only.
    pub fn pop_slice(&self, dst: &mut [T]) -> usize {
        self.pop_slice_with(dst, |_| {})
    }

    /// As [`pop_slice`](Self::pop_slice), invoking `notify(k)` after each
    /// release store that returned `k` slots to the producer.
    ///
    /// The callback runs on the consumer thread and can wake a waiting
    /// producer after every incremental release; it must not call back into
    /// the producer role.
    pub fn pop_slice_with<F>(&self, dst: &mut [T], mut notify: F) -> usize
    where
        F: FnMut(usize),
    {
        let mut tail = I::load(&self.tail, Ordering::Relaxed);
        let mut read = 0;

        while read < dst.len() {
            let head = Self::load_acquire(&self.head);
            let pending = head.distance(tail);
            if pending == 0 {
                break;
            }

            let run = (dst.len() - read).min(pending);
            let offset = tail.widen() & Self::MASK;
            let first = run.min(N - offset);

            // SAFETY: `pending` slots starting at `offset` were published by
            // the producer (acquire load above) and stay consumer-owned
            // until the release store. The copy is split at the wraparound
            // boundary; `dst` is caller memory that cannot alias the slots.
            unsafe {
                ptr::copy_nonoverlapping(self.slot_ptr_at(offset), dst.as_mut_ptr().add(read), first);
                if run > first {
                    ptr::copy_nonoverlapping(
                        self.slot_ptr_at(0),
                        dst.as_mut_ptr().add(read + first),
                        run - first,
                    );
                }
            }

            tail = tail.advance(run);
            Self::store_release(&self.tail, tail);
            read += run;
            notify(run);
        }

        read
    }

    /// Consumer-side reset: drains every pending element by advancing
    /// `tail` to the producer's position.
    ///
    /// Mutates only the consumer-owned counter. Consumer role only.
    #[inline]
    pub fn consumer_clear(&self) {
        let head = I::load(&self.head, Ordering::Relaxed);
        I::store(&self.tail, head, Ordering::Relaxed);
    }
}

impl<T: Copy, const N: usize, I: RingIndex, const FAKE_TSO: bool> Default
    for RingBuffer<T, N, I, FAKE_TSO>
{
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TYPE ALIASES FOR COMMON CONFIGURATIONS
// =============================================================================

/// Ring buffer with hardware barriers erased, for single-core TSO targets
/// (interrupt-to-thread handoff on one core, uniprocessor systems).
pub type TsoRingBuffer<T, const N: usize, I = usize> = RingBuffer<T, N, I, true>;

// =============================================================================
// TESTS
// =============================================================================
