//! Timed pulses on the power and reset header lines.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::config::Timings;
use crate::lines::OutputLine;
use crate::time::Duration;

/// Identifies one of the two header outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineId {
    /// Motherboard power switch header.
    Power,
    /// Motherboard reset switch header.
    Reset,
}

/// One pulse: which line to assert and for how long.
///
/// The active level is a property of the [`OutputLine`] the pulse is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulseSpec {
    pub line: LineId,
    /// How long the line is held active.
    pub duration: Duration,
}

impl PulseSpec {
    /// Creates a pulse spec.
    #[inline]
    pub const fn new(line: LineId, duration: Duration) -> Self {
        Self { line, duration }
    }

    /// Short pulse on the reset line.
    pub const fn reset(timings: &Timings) -> Self {
        Self::new(LineId::Reset, timings.reset_pulse)
    }

    /// Short pulse on the power line; toggles the machine on or off.
    pub const fn toggle(timings: &Timings) -> Self {
        Self::new(LineId::Power, timings.toggle_pulse)
    }

    /// Long hold on the power line; forces a hard power-off.
    pub const fn forced_off(timings: &Timings) -> Self {
        Self::new(LineId::Power, timings.forced_off_pulse)
    }
}

/// Pin failures observed while pulsing a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PulseError {
    /// The line could not be driven active. It was still driven idle afterwards.
    Activate(LineId),
    /// The line could not be returned to idle.
    Deactivate(LineId),
}

impl core::fmt::Display for PulseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PulseError::Activate(line) => write!(f, "failed to activate {:?} line", line),
            PulseError::Deactivate(line) => {
                write!(f, "failed to release {:?} line, header may still be asserted", line)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PulseError {}

/// Drives the power and reset lines with blocking, timed pulses.
///
/// Never call [`trigger`](Self::trigger) from an interrupt handler or from a
/// context that has to answer a request promptly; queue a
/// [`PcCommand`](crate::PcCommand) and let a [`CommandRunner`](crate::CommandRunner)
/// execute it from the main loop instead.
///
/// # Type Parameters
/// * `'a` - Lifetime of the shared line references
/// * `PW` - Power line pin type
/// * `RS` - Reset line pin type
/// * `D` - Blocking delay provider
pub struct PulseActuator<'a, PW: OutputPin, RS: OutputPin, D: DelayNs> {
    power: &'a OutputLine<PW>,
    reset: &'a OutputLine<RS>,
    delay: D,
}

impl<'a, PW: OutputPin, RS: OutputPin, D: DelayNs> PulseActuator<'a, PW, RS, D> {
    /// Creates an actuator and releases both lines.
    pub fn new(power: &'a OutputLine<PW>, reset: &'a OutputLine<RS>, delay: D) -> Self {
        if power.deactivate().is_err() {
            warn!("power line could not be released at startup");
        }
        if reset.deactivate().is_err() {
            warn!("reset line could not be released at startup");
        }

        Self {
            power,
            reset,
            delay,
        }
    }

    /// Asserts the line for `spec.duration`, then releases it.
    ///
    /// Blocks for the whole pulse. The release is always attempted, whatever
    /// happened on activation; a failed release is reported in preference to
    /// a failed activation since it leaves the header asserted.
    pub fn trigger(&mut self, spec: PulseSpec) -> Result<(), PulseError> {
        debug!(
            "pulse {:?} line for {} ms",
            spec.line,
            spec.duration.as_millis()
        );
        match spec.line {
            LineId::Power => pulse(self.power, &mut self.delay, spec),
            LineId::Reset => pulse(self.reset, &mut self.delay, spec),
        }
    }
}

fn pulse<O: OutputPin, D: DelayNs>(
    line: &OutputLine<O>,
    delay: &mut D,
    spec: PulseSpec,
) -> Result<(), PulseError> {
    let activated = line.activate();
    delay.delay_ms(spec.duration.as_millis());
    let released = line.deactivate();

    if released.is_err() {
        warn!("{:?} line release failed", spec.line);
        return Err(PulseError::Deactivate(spec.line));
    }
    if activated.is_err() {
        warn!("{:?} line activation failed", spec.line);
        return Err(PulseError::Activate(spec.line));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_pulses_use_configured_durations() {
        let timings = Timings::DEFAULT;
        assert_eq!(
            PulseSpec::reset(&timings),
            PulseSpec::new(LineId::Reset, Duration::from_millis(100))
        );
        assert_eq!(
            PulseSpec::toggle(&timings),
            PulseSpec::new(LineId::Power, Duration::from_millis(100))
        );
        assert_eq!(
            PulseSpec::forced_off(&timings),
            PulseSpec::new(LineId::Power, Duration::from_millis(5_000))
        );
    }
}
