//! Polled short/long press classification.
//!
//! Provides [`SignalDebouncer`], a three-state machine fed with the sampled
//! level of a button once per main-loop cycle, and [`Button`], which binds a
//! debouncer to an input pin and a pair of [`ButtonActions`].

use embedded_hal::digital::{InputPin, PinState};

use crate::config::PressThresholds;
use crate::lighting::Lighting;
use crate::time::Instant;

/// A classified press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PressEvent {
    /// Released after the minimum press time and before the long-press threshold.
    Short,
    /// Held past the long-press threshold. Fires while still held.
    Long,
}

/// State of a single button.
///
/// A long press can only have fired while the button is held, so there is no
/// way to represent "released but long press fired".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonState {
    /// Released.
    Idle,
    /// Held since `since`, long press not yet fired.
    Pressed { since: Instant },
    /// Held since `since`, long press already fired for this press.
    LongPressed { since: Instant },
}

impl ButtonState {
    /// Returns true while the button is held.
    pub fn is_pressed(&self) -> bool {
        !matches!(self, ButtonState::Idle)
    }

    /// Returns true once the long press fired for the current press.
    pub fn long_press_fired(&self) -> bool {
        matches!(self, ButtonState::LongPressed { .. })
    }

    /// When the current press started.
    pub fn press_start(&self) -> Option<Instant> {
        match self {
            ButtonState::Idle => None,
            ButtonState::Pressed { since } | ButtonState::LongPressed { since } => Some(*since),
        }
    }
}

/// Classifies sampled button levels into short and long presses.
///
/// Short and long presses are mutually exclusive per press cycle, and each
/// fires at most once. Releases before the minimum press time are bounce
/// and produce nothing.
#[derive(Debug, Clone)]
pub struct SignalDebouncer {
    state: ButtonState,
    thresholds: PressThresholds,
    active: PinState,
}

impl SignalDebouncer {
    /// Creates a debouncer for an active-low (pulled-up) button.
    pub const fn new(thresholds: PressThresholds) -> Self {
        Self::with_active_level(thresholds, PinState::Low)
    }

    /// Creates a debouncer for a button that reads `active` while pressed.
    pub const fn with_active_level(thresholds: PressThresholds, active: PinState) -> Self {
        Self {
            state: ButtonState::Idle,
            thresholds,
            active,
        }
    }

    /// Feeds one sample and returns the event it completes, if any.
    pub fn update(&mut self, level: PinState, now: Instant) -> Option<PressEvent> {
        let pressed = level == self.active;

        match (self.state, pressed) {
            (ButtonState::Idle, true) => {
                self.state = ButtonState::Pressed { since: now };
                None
            }
            (ButtonState::Idle, false) => None,
            (ButtonState::Pressed { since }, true) => {
                if now.duration_since(since) > self.thresholds.long_press {
                    self.state = ButtonState::LongPressed { since };
                    Some(PressEvent::Long)
                } else {
                    None
                }
            }
            (ButtonState::LongPressed { .. }, true) => None,
            (ButtonState::Pressed { since }, false) => {
                self.state = ButtonState::Idle;
                let held = now.duration_since(since);
                if held < self.thresholds.min_press {
                    trace!("discarded {} ms bounce", held.as_millis());
                    None
                } else {
                    Some(PressEvent::Short)
                }
            }
            (ButtonState::LongPressed { .. }, false) => {
                self.state = ButtonState::Idle;
                None
            }
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> ButtonState {
        self.state
    }

    /// Returns the configured thresholds.
    pub fn thresholds(&self) -> PressThresholds {
        self.thresholds
    }
}

/// What a button does on each kind of press.
pub trait ButtonActions<L: Lighting> {
    /// Runs once when a short press is released.
    fn short_press(&mut self, lighting: &mut L);

    /// Runs once when a press crosses the long-press threshold.
    fn long_press(&mut self, lighting: &mut L);
}

/// A polled input pin with its debouncer and actions.
pub struct Button<I, A> {
    pin: I,
    debouncer: SignalDebouncer,
    actions: A,
}

impl<I: InputPin, A> Button<I, A> {
    /// Creates an active-low button.
    pub fn new(pin: I, actions: A, thresholds: PressThresholds) -> Self {
        Self {
            pin,
            debouncer: SignalDebouncer::new(thresholds),
            actions,
        }
    }

    /// Samples the pin once, runs the matching action, and returns the event.
    ///
    /// A failed pin read skips this cycle without touching the state machine.
    pub fn poll<L>(&mut self, now: Instant, lighting: &mut L) -> Option<PressEvent>
    where
        L: Lighting,
        A: ButtonActions<L>,
    {
        let level = match self.pin.is_high() {
            Ok(high) => PinState::from(high),
            Err(_) => {
                warn!("button read failed, skipping cycle");
                return None;
            }
        };

        let event = self.debouncer.update(level, now)?;
        match event {
            PressEvent::Short => self.actions.short_press(lighting),
            PressEvent::Long => self.actions.long_press(lighting),
        }
        Some(event)
    }

    /// Returns the current state.
    pub fn state(&self) -> ButtonState {
        self.debouncer.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRESSED: PinState = PinState::Low;
    const RELEASED: PinState = PinState::High;

    fn at(ms: u32) -> Instant {
        Instant::from_millis(ms)
    }

    #[test]
    fn press_is_recorded_on_first_low_sample() {
        let mut debouncer = SignalDebouncer::new(PressThresholds::DEFAULT);
        assert_eq!(debouncer.update(PRESSED, at(10)), None);
        assert_eq!(debouncer.state(), ButtonState::Pressed { since: at(10) });
    }

    #[test]
    fn long_press_requires_strictly_more_than_threshold() {
        let mut debouncer = SignalDebouncer::new(PressThresholds::DEFAULT);
        debouncer.update(PRESSED, at(0));
        assert_eq!(debouncer.update(PRESSED, at(600)), None);
        assert_eq!(debouncer.update(PRESSED, at(601)), Some(PressEvent::Long));
        assert!(debouncer.state().long_press_fired());
    }

    #[test]
    fn release_at_exactly_min_press_is_short() {
        let mut debouncer = SignalDebouncer::new(PressThresholds::DEFAULT);
        debouncer.update(PRESSED, at(100));
        assert_eq!(debouncer.update(RELEASED, at(150)), Some(PressEvent::Short));
    }

    #[test]
    fn release_clears_long_press_flag() {
        let mut debouncer = SignalDebouncer::new(PressThresholds::DEFAULT);
        debouncer.update(PRESSED, at(0));
        debouncer.update(PRESSED, at(700));
        assert_eq!(debouncer.update(RELEASED, at(800)), None);
        assert_eq!(debouncer.state(), ButtonState::Idle);
        assert!(!debouncer.state().long_press_fired());
    }

    #[test]
    fn active_high_button_inverts_levels() {
        let mut debouncer =
            SignalDebouncer::with_active_level(PressThresholds::DEFAULT, PinState::High);
        debouncer.update(PinState::High, at(0));
        assert_eq!(
            debouncer.update(PinState::Low, at(200)),
            Some(PressEvent::Short)
        );
    }
}
