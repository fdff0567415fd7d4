//! RingSPSC - Lock-Free Single-Producer Single-Consumer Ring Buffer
//!
//! A bounded, wait-free SPSC ring buffer for trivially-copyable values,
//! parameterized at compile time over element type, capacity, index width
//! and barrier strategy. Built for handing values between two threads, or
//! between an interrupt/DMA context and a thread, with constant-time,
//! allocation-free operations.
//!
//! # Key Features
//!
//! - 128-byte counter separation (prefetcher false sharing elimination)
//! - Free-running counters: full/empty disambiguation without wasting a slot
//! - Batch push/pop with at most two bulk copies per lap, and optional
//!   per-publication notification callbacks
//! - Narrow index types (`u8`, `u16`) for microcontroller-sized atomics
//! - `FAKE_TSO` mode erasing hardware barriers on total-store-ordering
//!   targets, keeping compiler fences only
//! - Compile-time validation of every capacity / index-type pairing
//!
//! # Example
//!
//! ```
//! use ringspsc_rs::RingBuffer;
//!
//! let mut ring = RingBuffer::<u32, 8>::new();
//! let (mut producer, mut consumer) = ring.split();
//!
//! // Single elements
//! assert!(producer.push(7).is_ok());
//! assert_eq!(consumer.pop(), Ok(7));
//!
//! // Batches, split transparently at the wraparound boundary
//! assert_eq!(producer.push_slice(&[1, 2, 3, 4]), 4);
//! let mut out = [0u32; 8];
//! assert_eq!(consumer.pop_slice(&mut out), 4);
//! assert_eq!(&out[..4], &[1, 2, 3, 4]);
//! ```
//!
//! The raw [`RingBuffer`] methods offer the same operations without the
//! handle indirection for callers (static ring in an interrupt handler,
//! say) that uphold the one-thread-per-role contract themselves.

mod backoff;
mod index;
mod invariants;
mod ring;
mod split;

pub use backoff::Backoff;
pub use index::RingIndex;
pub use ring::{RingBuffer, TsoRingBuffer};
pub use split::{Consumer, PopError, Producer, PushError};
