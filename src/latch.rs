//! Edge capture shared between interrupt handlers and the main loop.
//!
//! Interrupt handlers only ever store a single word-sized timestamp (and, for
//! the touch relay, write one pin). All decisions that involve more than one
//! step run in the main loop.
//!
//! A stored value of zero means "nothing captured". A capture taken exactly at
//! millisecond zero is stored as one, so ages are measured with `age`,
//! which reads a capture that appears to lie in the future as zero old.

use embedded_hal::digital::{OutputPin, PinState};
use portable_atomic::{AtomicU32, Ordering};

use crate::config::Timings;
use crate::lines::OutputLine;
use crate::time::{Duration, Instant};

const EMPTY: u32 = 0;

struct Stamp(AtomicU32);

impl Stamp {
    const fn new() -> Self {
        Stamp(AtomicU32::new(EMPTY))
    }

    fn load(&self) -> Option<Instant> {
        match self.0.load(Ordering::Acquire) {
            EMPTY => None,
            millis => Some(Instant::from_millis(millis)),
        }
    }

    fn store(&self, at: Instant) {
        self.0.store(encode(at), Ordering::Release);
    }

    /// Clears the stamp only if it still holds `seen`.
    fn clear_if(&self, seen: Instant) -> bool {
        self.0
            .compare_exchange(encode(seen), EMPTY, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn clear(&self) {
        self.0.store(EMPTY, Ordering::Release);
    }
}

fn encode(at: Instant) -> u32 {
    match at.as_millis() {
        EMPTY => 1,
        millis => millis,
    }
}

/// Time elapsed since `since`, or zero if `since` is ahead of `now`.
///
/// Any span longer than half the counter range is taken as a capture from the
/// future rather than a very old one.
fn age(now: Instant, since: Instant) -> Duration {
    let elapsed = now.duration_since(since);
    if elapsed.as_millis() > u32::MAX / 2 {
        Duration::ZERO
    } else {
        elapsed
    }
}

/// Records an edge from interrupt context and confirms it once it has aged
/// past a fixed window.
///
/// Used for the power-loss line: the falling-edge handler calls
/// [`record`](Self::record), the main loop calls
/// [`take_confirmed`](Self::take_confirmed) every cycle.
pub struct EdgeLatch {
    stamp: Stamp,
    window: Duration,
}

impl EdgeLatch {
    /// Creates an empty latch. `const` so it can back a `static`.
    pub const fn new(window: Duration) -> Self {
        Self {
            stamp: Stamp::new(),
            window,
        }
    }

    /// Creates an empty latch with the shutdown confirmation window from
    /// `timings`.
    pub const fn from_timings(timings: &Timings) -> Self {
        Self::new(timings.shutdown_confirm)
    }

    /// Records an edge at `now`. Interrupt safe: one atomic store.
    ///
    /// A newer edge replaces an unconsumed older one, restarting the window.
    #[inline]
    pub fn record(&self, now: Instant) {
        self.stamp.store(now);
    }

    /// Consumes the pending edge if it is older than the window.
    ///
    /// Returns true at most once per recorded edge. If the interrupt records a
    /// newer edge between the age check and the clear, the newer edge is kept
    /// and this call returns false.
    pub fn take_confirmed(&self, now: Instant) -> bool {
        let Some(since) = self.stamp.load() else {
            return false;
        };
        if age(now, since) <= self.window {
            return false;
        }
        self.stamp.clear_if(since)
    }

    /// When the pending edge was captured, if one is pending.
    pub fn pending_since(&self) -> Option<Instant> {
        self.stamp.load()
    }

    /// Returns true while an edge is waiting to be confirmed.
    pub fn is_pending(&self) -> bool {
        self.pending_since().is_some()
    }

    /// Drops any pending edge.
    pub fn clear(&self) {
        self.stamp.clear();
    }

    /// Confirmation window.
    pub fn window(&self) -> Duration {
        self.window
    }
}

/// Result of one touch-line change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TouchOutcome {
    /// Rising edge honored; output driven active.
    Activated,
    /// Falling edge honored; output driven idle.
    Deactivated,
    /// Rising edge inside the guard window; output left untouched.
    Suppressed,
}

/// Mirrors a touch sensor onto an output line from interrupt context.
///
/// Runs entirely inside the change interrupt so the output follows the
/// sensor without main-loop latency. A rising edge that arrives within the
/// guard window of the last honored edge is treated as bounce.
pub struct TouchLatch {
    last: Stamp,
    guard: Duration,
}

impl TouchLatch {
    /// Creates a latch with no prior capture; the first edge is always honored.
    pub const fn new(guard: Duration) -> Self {
        Self {
            last: Stamp::new(),
            guard,
        }
    }

    /// Creates a latch with the touch guard window from `timings`.
    pub const fn from_timings(timings: &Timings) -> Self {
        Self::new(timings.touch_guard)
    }

    /// Handles one change of the touch line, now reading `level`.
    ///
    /// Interrupt safe: at most one pin write and one atomic store. The guard
    /// timestamp is updated even if the pin write fails, and the pin error is
    /// returned for the caller to ignore or count.
    pub fn on_change<O: OutputPin>(
        &self,
        level: PinState,
        now: Instant,
        line: &OutputLine<O>,
    ) -> Result<TouchOutcome, O::Error> {
        let rising = level == PinState::High;

        if rising {
            if let Some(last) = self.last.load() {
                if age(now, last) < self.guard {
                    return Ok(TouchOutcome::Suppressed);
                }
            }
        }

        let written = line.set_active(rising);
        self.last.store(now);
        written?;

        Ok(if rising {
            TouchOutcome::Activated
        } else {
            TouchOutcome::Deactivated
        })
    }

    /// When the last honored edge happened.
    pub fn last_capture(&self) -> Option<Instant> {
        self.last.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ms: u32) -> Instant {
        Instant::from_millis(ms)
    }

    #[test]
    fn fresh_latch_has_nothing_pending() {
        let latch = EdgeLatch::new(Duration::from_millis(500));
        assert!(!latch.is_pending());
        assert!(!latch.take_confirmed(at(10_000)));
    }

    #[test]
    fn edge_is_not_confirmed_inside_window() {
        let latch = EdgeLatch::new(Duration::from_millis(500));
        latch.record(at(1_000));
        assert!(!latch.take_confirmed(at(1_500)));
        assert!(latch.is_pending());
    }

    #[test]
    fn edge_is_confirmed_once_after_window() {
        let latch = EdgeLatch::new(Duration::from_millis(500));
        latch.record(at(1_000));
        assert!(latch.take_confirmed(at(1_501)));
        assert!(!latch.is_pending());
        assert!(!latch.take_confirmed(at(1_600)));
    }

    #[test]
    fn newer_edge_restarts_window() {
        let latch = EdgeLatch::new(Duration::from_millis(500));
        latch.record(at(1_000));
        latch.record(at(1_400));
        assert!(!latch.take_confirmed(at(1_600)));
        assert!(latch.take_confirmed(at(1_901)));
    }

    #[test]
    fn edge_at_time_zero_is_still_captured() {
        let latch = EdgeLatch::new(Duration::from_millis(500));
        latch.record(at(0));
        assert!(latch.is_pending());
        assert!(latch.take_confirmed(at(502)));
    }

    #[test]
    fn edge_at_time_zero_waits_out_the_window() {
        let latch = EdgeLatch::new(Duration::from_millis(500));
        latch.record(at(0));
        assert!(!latch.take_confirmed(at(0)));
        assert!(!latch.take_confirmed(at(500)));
        assert!(latch.is_pending());
        assert!(latch.take_confirmed(at(502)));
    }

    #[test]
    fn timings_set_both_windows() {
        let timings = Timings {
            touch_guard: Duration::from_millis(200),
            shutdown_confirm: Duration::from_millis(800),
            ..Timings::DEFAULT
        };
        assert_eq!(EdgeLatch::from_timings(&timings).window(), Duration::from_millis(800));
        assert_eq!(TouchLatch::from_timings(&timings).guard, Duration::from_millis(200));
    }

    #[test]
    fn confirmation_spans_counter_rollover() {
        let latch = EdgeLatch::new(Duration::from_millis(500));
        latch.record(at(u32::MAX - 100));
        assert!(!latch.take_confirmed(at(300)));
        assert!(latch.take_confirmed(at(450)));
    }
}
