//! Debug assertion macros for the counter discipline.
//!
//! Only active in debug builds (`debug_assert!`), so there is zero overhead
//! in release builds. Monotonicity cannot be asserted on the raw counter
//! values because narrow index types wrap routinely; the checks below are
//! phrased in modular distances, which stay exact.

/// Assert that the live element count never exceeds capacity.
///
/// Checked at every publication point before the release store.
macro_rules! debug_assert_gap_bounded {
    ($count:expr, $capacity:expr) => {
        debug_assert!(
            $count <= $capacity,
            "counter discipline violated: {} elements in a ring of {}",
            $count,
            $capacity
        )
    };
}

/// Assert that a consumer-side access stays inside the published window.
///
/// Checked before dereferencing a slot at a given offset from the front.
macro_rules! debug_assert_within_published {
    ($offset:expr, $published:expr) => {
        debug_assert!(
            $offset < $published,
            "slot access at offset {} outside the {} published elements",
            $offset,
            $published
        )
    };
}

pub(crate) use debug_assert_gap_bounded;
pub(crate) use debug_assert_within_published;
