//! Shareable wrappers around the physical lines.
//!
//! Both the touch interrupt and the pulse actuator drive the power line, and
//! the request path, the command runner and the main loop all read the
//! power-sense line. Each pin therefore lives behind a
//! `critical_section::Mutex` so it can be reached through a shared
//! `&'static` reference from any context. Every access is a single pin
//! operation; no critical section spans a delay.

use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal::digital::{InputPin, OutputPin, PinState};

/// Power state of the attached machine, as read from the sense line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    /// Sense line reads the powered level.
    On,
    /// Sense line reads the off level.
    Off,
    /// The sense pin could not be read.
    Unknown,
}

impl PowerState {
    /// Returns true only when the machine is known to be powered.
    pub fn is_on(&self) -> bool {
        *self == PowerState::On
    }
}

/// An output pin with a fixed active level, shareable across contexts.
///
/// The PC front-panel header is ground-activated, so the bridge lines are
/// usually built with [`PinState::Low`] as the active level.
pub struct OutputLine<O> {
    pin: Mutex<RefCell<O>>,
    active: PinState,
}

impl<O: OutputPin> OutputLine<O> {
    /// Wraps `pin`. Does not touch the pin; call [`deactivate`](Self::deactivate)
    /// during setup to put it in its idle state.
    pub const fn new(pin: O, active: PinState) -> Self {
        Self {
            pin: Mutex::new(RefCell::new(pin)),
            active,
        }
    }

    /// Level at which this line is asserted.
    pub fn active_level(&self) -> PinState {
        self.active
    }

    /// Drives the line to its active level.
    pub fn activate(&self) -> Result<(), O::Error> {
        self.set_active(true)
    }

    /// Drives the line to its idle level.
    pub fn deactivate(&self) -> Result<(), O::Error> {
        self.set_active(false)
    }

    /// Drives the line active or idle.
    pub fn set_active(&self, active: bool) -> Result<(), O::Error> {
        let level = if active { self.active } else { !self.active };
        critical_section::with(|cs| self.pin.borrow_ref_mut(cs).set_state(level))
    }
}

/// The power-sense input.
pub struct SenseLine<I> {
    pin: Mutex<RefCell<I>>,
    off_level: PinState,
}

impl<I: InputPin> SenseLine<I> {
    /// Wraps a sense pin that reads low while the machine is off.
    pub const fn new(pin: I) -> Self {
        Self::with_off_level(pin, PinState::Low)
    }

    /// Wraps a sense pin with an explicit "machine off" level.
    pub const fn with_off_level(pin: I, off_level: PinState) -> Self {
        Self {
            pin: Mutex::new(RefCell::new(pin)),
            off_level,
        }
    }

    /// Reads the sense line. Never cached.
    pub fn state(&self) -> PowerState {
        let read = critical_section::with(|cs| self.pin.borrow_ref_mut(cs).is_high());
        match read {
            Ok(high) if PinState::from(high) == self.off_level => PowerState::Off,
            Ok(_) => PowerState::On,
            Err(_) => PowerState::Unknown,
        }
    }

    /// Returns true when the sense line reads the powered level.
    pub fn is_powered(&self) -> bool {
        self.state().is_on()
    }
}
