//! Timing configuration.

use crate::time::Duration;

/// Presses shorter than this are treated as contact bounce.
pub const MIN_PRESS: Duration = Duration::from_millis(50);

/// Holding a button longer than this is a long press.
pub const LONG_PRESS: Duration = Duration::from_millis(600);

/// Rising touch edges closer than this to the last honored edge are ignored.
pub const TOUCH_GUARD: Duration = Duration::from_millis(500);

/// A power-loss edge must be this old before it is acted on.
pub const SHUTDOWN_CONFIRM: Duration = Duration::from_millis(500);

/// Reset header pulse.
pub const RESET_PULSE: Duration = Duration::from_millis(100);

/// Power header pulse that toggles the machine on or off.
pub const TOGGLE_PULSE: Duration = Duration::from_millis(100);

/// Power header hold that forces a hard power-off on most motherboards.
pub const FORCED_OFF_PULSE: Duration = Duration::from_millis(5_000);

/// Thresholds used to classify a single press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PressThresholds {
    /// Releases before this are discarded silently.
    pub min_press: Duration,
    /// Holds beyond this fire the long-press action.
    pub long_press: Duration,
}

impl PressThresholds {
    /// [`MIN_PRESS`] and [`LONG_PRESS`].
    pub const DEFAULT: Self = PressThresholds {
        min_press: MIN_PRESS,
        long_press: LONG_PRESS,
    };
}

impl Default for PressThresholds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Every timing constant used by the bridge.
///
/// The two latch windows are fixed when the latch is built, through
/// `EdgeLatch::from_timings` and `TouchLatch::from_timings`. The pulse
/// lengths are read by `CommandRunner::with_timings`, and `press` is what
/// `PowerSequencer::with_thresholds` takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timings {
    /// Button press classification.
    pub press: PressThresholds,
    /// Rising touch edges closer than this to the last honored edge are ignored.
    pub touch_guard: Duration,
    /// Age a power-loss edge must exceed before it is acted on.
    pub shutdown_confirm: Duration,
    /// Reset header pulse length.
    pub reset_pulse: Duration,
    /// Power header toggle pulse length.
    pub toggle_pulse: Duration,
    /// Power header hold for a forced power-off.
    pub forced_off_pulse: Duration,
}

impl Timings {
    /// The constants defined in this module.
    pub const DEFAULT: Self = Timings {
        press: PressThresholds::DEFAULT,
        touch_guard: TOUCH_GUARD,
        shutdown_confirm: SHUTDOWN_CONFIRM,
        reset_pulse: RESET_PULSE,
        toggle_pulse: TOGGLE_PULSE,
        forced_off_pulse: FORCED_OFF_PULSE,
    };
}

impl Default for Timings {
    fn default() -> Self {
        Self::DEFAULT
    }
}
