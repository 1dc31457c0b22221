//! Millisecond time types and the time source abstraction.
//!
//! Timestamps are 32-bit so they fit in a single atomic word and can be
//! handed from interrupt context to the main loop without locking. The
//! counter wraps after ~49.7 days; all arithmetic is wrapping.

/// Trait for abstracting time sources.
pub trait TimeSource {
    /// Returns the current time instant.
    fn now(&self) -> Instant;
}

/// Span of time in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Duration(u32);

impl Duration {
    /// Zero duration constant.
    pub const ZERO: Self = Duration(0);

    /// Creates duration from milliseconds.
    #[inline]
    pub const fn from_millis(millis: u32) -> Self {
        Duration(millis)
    }

    /// Converts duration to milliseconds.
    #[inline]
    pub const fn as_millis(&self) -> u32 {
        self.0
    }
}

/// Point in time, in milliseconds since an arbitrary epoch (usually boot).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Instant(u32);

impl Instant {
    /// Creates an instant from a raw millisecond counter value.
    #[inline]
    pub const fn from_millis(millis: u32) -> Self {
        Instant(millis)
    }

    /// Returns the raw millisecond counter value.
    #[inline]
    pub const fn as_millis(&self) -> u32 {
        self.0
    }

    /// Calculates duration since an earlier instant.
    ///
    /// Uses wrapping subtraction, so an instant taken shortly after the
    /// counter rolled over still measures correctly against one taken
    /// before it.
    #[inline]
    pub const fn duration_since(&self, earlier: Instant) -> Duration {
        Duration(self.0.wrapping_sub(earlier.0))
    }

    /// Adds a duration, wrapping on counter overflow.
    #[inline]
    pub const fn wrapping_add(self, duration: Duration) -> Self {
        Instant(self.0.wrapping_add(duration.0))
    }
}
