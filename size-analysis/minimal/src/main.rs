#![no_std]
#![no_main]

use core::convert::Infallible;

use cortex_m_rt::entry;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin, PinState};
use panic_halt as _;
use pc_power_bridge::{
    CommandGateway, CommandQueue, CommandRunner, EdgeLatch, EffectId, Instant, Lighting, Method,
    OutputLine, PowerSequencer, PulseActuator, SenseLine, TimeSource, Timings, TouchLatch,
};

// ============================================================================
// Minimal Pins
// ============================================================================

/// Zero-size pin for measuring library overhead
pub struct MinimalPin;

impl ErrorType for MinimalPin {
    type Error = Infallible;
}

impl InputPin for MinimalPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(core::hint::black_box(true))
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(core::hint::black_box(false))
    }
}

impl OutputPin for MinimalPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        core::hint::black_box(());
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        core::hint::black_box(());
        Ok(())
    }
}

pub struct MinimalDelay;

impl DelayNs for MinimalDelay {
    fn delay_ns(&mut self, ns: u32) {
        core::hint::black_box(ns);
    }
}

// ============================================================================
// Minimal Lighting and TimeSource
// ============================================================================

pub struct MinimalLighting {
    lit: bool,
    effect: EffectId,
}

impl Lighting for MinimalLighting {
    fn is_lit(&self) -> bool {
        self.lit
    }

    fn set_lit(&mut self, lit: bool) {
        self.lit = lit;
    }

    fn effect(&self) -> EffectId {
        self.effect
    }

    fn set_effect(&mut self, effect: EffectId) {
        self.effect = effect;
    }

    fn effect_count(&self) -> u8 {
        8
    }

    fn reset_palette_override(&mut self) {
        core::hint::black_box(());
    }

    fn random_color(&mut self, persist: bool, notify: bool) {
        core::hint::black_box((persist, notify));
    }

    fn notify_state_changed(&mut self) {
        core::hint::black_box(());
    }
}

pub struct MinimalTimeSource;

impl TimeSource for MinimalTimeSource {
    fn now(&self) -> Instant {
        Instant::from_millis(core::hint::black_box(0))
    }
}

// ============================================================================
// Shared State
// ============================================================================

static POWER_LINE: OutputLine<MinimalPin> = OutputLine::new(MinimalPin, PinState::Low);
static RESET_LINE: OutputLine<MinimalPin> = OutputLine::new(MinimalPin, PinState::Low);
static SENSE: SenseLine<MinimalPin> = SenseLine::new(MinimalPin);
static POWER_LOSS: EdgeLatch = EdgeLatch::from_timings(&Timings::DEFAULT);
static TOUCH: TouchLatch = TouchLatch::from_timings(&Timings::DEFAULT);
static QUEUE: CommandQueue<4> = CommandQueue::new();

// This function uses the library to prevent optimizer from removing code
#[inline(never)]
fn exercise_bridge() {
    let time_source = MinimalTimeSource;

    // Interrupt paths
    POWER_LOSS.record(time_source.now());
    let _ = TOUCH.on_change(PinState::High, time_source.now(), &POWER_LINE);

    // Request path
    let gateway = CommandGateway::new(&SENSE, &QUEUE);
    core::hint::black_box(gateway.handle(Method::parse("PUT"), "/pc/reset"));
    core::hint::black_box(gateway.handle(Method::Put, "/pc/poweroff"));

    // Main loop
    let lighting = MinimalLighting {
        lit: false,
        effect: EffectId::STATIC,
    };
    let mut sequencer = PowerSequencer::new(
        &time_source,
        MinimalPin,
        MinimalPin,
        &SENSE,
        &POWER_LOSS,
        lighting,
    );
    core::hint::black_box(sequencer.poll());

    let actuator = PulseActuator::new(&POWER_LINE, &RESET_LINE, MinimalDelay);
    let mut runner = CommandRunner::new(&QUEUE, &SENSE, actuator);
    core::hint::black_box(runner.run_all());
}

#[entry]
fn main() -> ! {
    // Call test function to ensure all code is included
    exercise_bridge();

    // Halt - this is a size analysis binary, not meant to run
    loop {
        cortex_m::asm::nop();
    }
}
