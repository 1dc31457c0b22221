//! Deferred actuation commands.
//!
//! Request handlers validate a [`PcCommand`] and push it onto a
//! [`CommandQueue`]; the main loop drains the queue through a
//! [`CommandRunner`], which performs the blocking pulse. The responding
//! context never waits for a pulse to finish.

use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use heapless::Deque;

use crate::config::Timings;
use crate::lines::SenseLine;
use crate::pulse::{PulseActuator, PulseError, PulseSpec};

/// Actions that can be requested on the attached machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PcCommand {
    /// Pulse the reset header. Requires the machine to be on.
    Reset,
    /// Short pulse on the power header. Toggles whatever the current state is.
    PowerToggle,
    /// Long hold on the power header. Requires the machine to be on.
    ForcedPowerOff,
}

impl PcCommand {
    /// Returns true if the command is refused while the machine is off.
    pub fn requires_power(&self) -> bool {
        match self {
            PcCommand::Reset | PcCommand::ForcedPowerOff => true,
            PcCommand::PowerToggle => false,
        }
    }

    /// Pulse that carries out this command.
    pub fn pulse(&self, timings: &Timings) -> PulseSpec {
        match self {
            PcCommand::Reset => PulseSpec::reset(timings),
            PcCommand::PowerToggle => PulseSpec::toggle(timings),
            PcCommand::ForcedPowerOff => PulseSpec::forced_off(timings),
        }
    }
}

/// Errors that can occur while submitting or running a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// The command needs the machine to be on and the sense line says it is not.
    PcNotPowered,
    /// The command queue has no free slot.
    QueueFull,
    /// The pulse ran but a line could not be driven.
    Pulse(PulseError),
}

impl core::fmt::Display for CommandError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CommandError::PcNotPowered => write!(f, "machine is not powered"),
            CommandError::QueueFull => write!(f, "command queue is full"),
            CommandError::Pulse(err) => write!(f, "pulse failed: {}", err),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CommandError {}

impl From<PulseError> for CommandError {
    fn from(err: PulseError) -> Self {
        CommandError::Pulse(err)
    }
}

/// Bounded FIFO of pending commands, shareable across contexts.
///
/// # Type Parameters
/// * `N` - Maximum number of pending commands
pub struct CommandQueue<const N: usize> {
    inner: Mutex<RefCell<Deque<PcCommand, N>>>,
}

impl<const N: usize> CommandQueue<N> {
    /// Creates an empty queue. `const` so it can back a `static`.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Deque::new())),
        }
    }

    /// Appends a command.
    pub fn push(&self, command: PcCommand) -> Result<(), CommandError> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).push_back(command))
            .map_err(|_| CommandError::QueueFull)
    }

    /// Removes the oldest command.
    pub fn pop(&self) -> Option<PcCommand> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).pop_front())
    }

    /// Number of pending commands.
    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.inner.borrow_ref(cs).len())
    }

    /// Returns true when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every pending command.
    pub fn clear(&self) {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).clear());
    }
}

impl<const N: usize> Default for CommandQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// A command taken off the queue and what became of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Execution {
    pub command: PcCommand,
    /// `Err(PcNotPowered)` if the precondition failed again at execution time.
    pub result: Result<(), CommandError>,
}

/// Executes queued commands from the main loop.
///
/// Preconditions are checked again right before each pulse; the power state
/// seen when the command was accepted is not trusted.
///
/// # Type Parameters
/// * `'a` - Lifetime of the shared queue and line references
/// * `PW` - Power line pin type
/// * `RS` - Reset line pin type
/// * `S` - Power-sense pin type
/// * `D` - Blocking delay provider
/// * `N` - Queue capacity
pub struct CommandRunner<'a, PW, RS, S, D, const N: usize>
where
    PW: OutputPin,
    RS: OutputPin,
    S: InputPin,
    D: DelayNs,
{
    queue: &'a CommandQueue<N>,
    sense: &'a SenseLine<S>,
    actuator: PulseActuator<'a, PW, RS, D>,
    timings: Timings,
}

impl<'a, PW, RS, S, D, const N: usize> CommandRunner<'a, PW, RS, S, D, N>
where
    PW: OutputPin,
    RS: OutputPin,
    S: InputPin,
    D: DelayNs,
{
    /// Creates a runner with the default pulse durations.
    pub fn new(
        queue: &'a CommandQueue<N>,
        sense: &'a SenseLine<S>,
        actuator: PulseActuator<'a, PW, RS, D>,
    ) -> Self {
        Self::with_timings(queue, sense, actuator, Timings::DEFAULT)
    }

    /// Creates a runner with custom pulse durations.
    pub fn with_timings(
        queue: &'a CommandQueue<N>,
        sense: &'a SenseLine<S>,
        actuator: PulseActuator<'a, PW, RS, D>,
        timings: Timings,
    ) -> Self {
        Self {
            queue,
            sense,
            actuator,
            timings,
        }
    }

    /// Runs the oldest pending command, blocking for its pulse.
    ///
    /// Returns `None` when the queue is empty.
    pub fn run_next(&mut self) -> Option<Execution> {
        let command = self.queue.pop()?;
        let result = self.execute(command);

        match result {
            Ok(()) => info!("executed {:?}", command),
            Err(err) => warn!("{:?} not executed: {:?}", command, err),
        }

        Some(Execution { command, result })
    }

    /// Runs every pending command in order. Returns how many were taken off
    /// the queue, whether or not they succeeded.
    pub fn run_all(&mut self) -> usize {
        let mut count = 0;
        while self.run_next().is_some() {
            count += 1;
        }
        count
    }

    fn execute(&mut self, command: PcCommand) -> Result<(), CommandError> {
        if command.requires_power() && !self.sense.is_powered() {
            return Err(CommandError::PcNotPowered);
        }
        self.actuator.trigger(command.pulse(&self.timings))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_toggle_runs_without_power() {
        assert!(PcCommand::Reset.requires_power());
        assert!(PcCommand::ForcedPowerOff.requires_power());
        assert!(!PcCommand::PowerToggle.requires_power());
    }

    #[test]
    fn queue_is_fifo_and_bounded() {
        let queue: CommandQueue<2> = CommandQueue::new();
        queue.push(PcCommand::Reset).unwrap();
        queue.push(PcCommand::PowerToggle).unwrap();
        assert_eq!(queue.push(PcCommand::ForcedPowerOff), Err(CommandError::QueueFull));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop(), Some(PcCommand::Reset));
        assert_eq!(queue.pop(), Some(PcCommand::PowerToggle));
        assert_eq!(queue.pop(), None);
        assert!(queue.is_empty());
    }
}
