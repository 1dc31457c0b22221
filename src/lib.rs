#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`SignalDebouncer`**: Classifies polled button levels into short and long presses
//! - **`Button`**: An input pin bound to a debouncer and a pair of `ButtonActions`
//! - **`EdgeLatch`**: Captures an edge timestamp from an interrupt, confirmed later by the main loop
//! - **`TouchLatch`**: Mirrors a touch sensor onto the power line from interrupt context
//! - **`PulseActuator`**: Drives the power and reset header lines with timed pulses
//! - **`PowerSequencer`**: Main-loop policy binding buttons, power-loss detection and lighting
//! - **`CommandGateway`**: Validates remote commands and queues them without blocking
//! - **`CommandRunner`**: Executes queued commands from the main loop
//! - **`Lighting`**: Trait to implement for the lighting subsystem
//! - **`TimeSource`**: Trait to implement for your timing system
//!
//! Pins are `embedded-hal` 1.0 `InputPin`/`OutputPin` implementations. Pins
//! that are touched from more than one context are wrapped in [`OutputLine`]
//! or [`SenseLine`], which guard every access with a critical section.

mod fmt;

pub mod button;
pub mod command;
pub mod config;
pub mod gateway;
pub mod latch;
pub mod lighting;
pub mod lines;
pub mod pulse;
pub mod sequencer;
pub mod time;

pub use button::{Button, ButtonActions, ButtonState, PressEvent, SignalDebouncer};
pub use command::{CommandError, CommandQueue, CommandRunner, Execution, PcCommand};
pub use config::{PressThresholds, Timings};
pub use gateway::{CommandGateway, Endpoint, Method, Response};
pub use latch::{EdgeLatch, TouchLatch, TouchOutcome};
pub use lighting::{EffectId, Lighting};
pub use lines::{OutputLine, PowerState, SenseLine};
pub use pulse::{LineId, PulseActuator, PulseError, PulseSpec};
pub use sequencer::{CycleReport, PowerButtonActions, PowerSequencer, ResetButtonActions};
pub use time::{Duration, Instant, TimeSource};

/// Default depth of the command queue.
pub const DEFAULT_QUEUE_DEPTH: usize = 4;
