//! Main-loop policy tying buttons, the power-loss latch and lighting together.
//!
//! Provides [`PowerSequencer`], which owns both button state machines and is
//! polled once per main-loop iteration, and the two [`ButtonActions`]
//! implementations that define what the front-panel buttons do to the
//! lighting.

use embedded_hal::digital::InputPin;

use crate::button::{Button, ButtonActions, ButtonState, PressEvent};
use crate::config::PressThresholds;
use crate::latch::EdgeLatch;
use crate::lighting::{EffectId, Lighting};
use crate::lines::{PowerState, SenseLine};
use crate::time::{Instant, TimeSource};

/// Power button: short press picks a random color, long press goes back to
/// a solid color with the effect's own palette. Both turn the lights on first.
#[derive(Debug, Clone, Copy, Default)]
pub struct PowerButtonActions;

impl<L: Lighting> ButtonActions<L> for PowerButtonActions {
    fn short_press(&mut self, lighting: &mut L) {
        if !lighting.is_lit() {
            lighting.set_lit(true);
        }
        lighting.random_color(false, true);
    }

    fn long_press(&mut self, lighting: &mut L) {
        if !lighting.is_lit() {
            lighting.set_lit(true);
        }
        lighting.set_effect(EffectId::STATIC);
        lighting.reset_palette_override();
        lighting.notify_state_changed();
    }
}

/// Reset button: short press turns the lights on, or cycles the effect if
/// they already are; long press turns them off.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResetButtonActions;

impl<L: Lighting> ButtonActions<L> for ResetButtonActions {
    fn short_press(&mut self, lighting: &mut L) {
        if !lighting.is_lit() {
            lighting.set_lit(true);
        } else {
            let next = lighting.effect().next(lighting.effect_count());
            lighting.set_effect(next);
        }
        lighting.notify_state_changed();
    }

    fn long_press(&mut self, lighting: &mut L) {
        if lighting.is_lit() {
            lighting.set_lit(false);
        }
        lighting.notify_state_changed();
    }
}

/// What happened during one [`PowerSequencer::poll`] cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleReport {
    pub power: Option<PressEvent>,
    pub reset: Option<PressEvent>,
    /// A power-loss edge was confirmed and the lights were switched off.
    pub shutdown_handled: bool,
}

impl CycleReport {
    /// Returns true if nothing happened.
    pub fn is_quiet(&self) -> bool {
        *self == CycleReport::default()
    }
}

/// Runs the button and shutdown policy from the main loop.
///
/// Owns both button state machines and the lighting facade. Shares the
/// power-loss [`EdgeLatch`] with the falling-edge interrupt and the
/// [`SenseLine`] with the request path.
///
/// # Type Parameters
/// * `'t` - Lifetime of the time source and shared references
/// * `T` - Time source implementation type
/// * `PB` - Power button pin type
/// * `RB` - Reset button pin type
/// * `S` - Power-sense pin type
/// * `L` - Lighting implementation type
pub struct PowerSequencer<'t, T, PB, RB, S, L>
where
    T: TimeSource,
    PB: InputPin,
    RB: InputPin,
    S: InputPin,
    L: Lighting,
{
    time_source: &'t T,
    power_button: Button<PB, PowerButtonActions>,
    reset_button: Button<RB, ResetButtonActions>,
    sense: &'t SenseLine<S>,
    shutdown: &'t EdgeLatch,
    lighting: L,
}

impl<'t, T, PB, RB, S, L> PowerSequencer<'t, T, PB, RB, S, L>
where
    T: TimeSource,
    PB: InputPin,
    RB: InputPin,
    S: InputPin,
    L: Lighting,
{
    /// Creates a sequencer with the default press thresholds.
    pub fn new(
        time_source: &'t T,
        power_button: PB,
        reset_button: RB,
        sense: &'t SenseLine<S>,
        shutdown: &'t EdgeLatch,
        lighting: L,
    ) -> Self {
        Self::with_thresholds(
            time_source,
            power_button,
            reset_button,
            sense,
            shutdown,
            lighting,
            PressThresholds::DEFAULT,
        )
    }

    /// Creates a sequencer with custom press thresholds.
    ///
    /// The shutdown confirmation window is a property of `shutdown` itself;
    /// see [`EdgeLatch::from_timings`].
    pub fn with_thresholds(
        time_source: &'t T,
        power_button: PB,
        reset_button: RB,
        sense: &'t SenseLine<S>,
        shutdown: &'t EdgeLatch,
        lighting: L,
        thresholds: PressThresholds,
    ) -> Self {
        Self {
            time_source,
            power_button: Button::new(power_button, PowerButtonActions, thresholds),
            reset_button: Button::new(reset_button, ResetButtonActions, thresholds),
            sense,
            shutdown,
            lighting,
        }
    }

    /// Runs one cycle: power button, reset button, then shutdown confirmation.
    pub fn poll(&mut self) -> CycleReport {
        let now = self.time_source.now();

        let power = self.power_button.poll(now, &mut self.lighting);
        if let Some(event) = power {
            debug!("power button {:?}", event);
        }

        let reset = self.reset_button.poll(now, &mut self.lighting);
        if let Some(event) = reset {
            debug!("reset button {:?}", event);
        }

        let shutdown_handled = self.handle_shutdown(now);

        CycleReport {
            power,
            reset,
            shutdown_handled,
        }
    }

    /// Acts on a confirmed power-loss edge.
    ///
    /// The sense line is read again once the window has elapsed, so a glitch
    /// that recovered within the window is ignored.
    fn handle_shutdown(&mut self, now: Instant) -> bool {
        if !self.shutdown.take_confirmed(now) {
            return false;
        }

        let state = self.sense.state();
        if state != PowerState::Off {
            debug!("power-loss edge not confirmed, sense reads {:?}", state);
            return false;
        }
        if !self.lighting.is_lit() {
            return false;
        }

        info!("machine powered off, switching lights off");
        self.lighting.set_lit(false);
        self.lighting.set_effect(EffectId::STATIC);
        self.lighting.notify_state_changed();
        true
    }

    /// State of the power button.
    pub fn power_button_state(&self) -> ButtonState {
        self.power_button.state()
    }

    /// State of the reset button.
    pub fn reset_button_state(&self) -> ButtonState {
        self.reset_button.state()
    }

    /// Returns a reference to the lighting facade.
    pub fn lighting(&self) -> &L {
        &self.lighting
    }

    /// Returns a mutable reference to the lighting facade.
    pub fn lighting_mut(&mut self) -> &mut L {
        &mut self.lighting
    }
}
