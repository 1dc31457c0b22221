//! Shared test infrastructure for pc-power-bridge integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, OutputPin, PinState};
use pc_power_bridge::{EffectId, Instant, Lighting, TimeSource};

// ============================================================================
// Mock Time Source
// ============================================================================

/// Mock clock with controllable time advancement. Clones share the same time.
#[derive(Clone, Default)]
pub struct MockClock {
    millis: Rc<Cell<u32>>,
}

impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(millis: u32) -> Self {
        let clock = Self::new();
        clock.set(millis);
        clock
    }

    /// Advance time by the given number of milliseconds
    pub fn advance(&self, millis: u32) {
        self.millis.set(self.millis.get().wrapping_add(millis));
    }

    pub fn set(&self, millis: u32) {
        self.millis.set(millis);
    }

    pub fn millis(&self) -> u32 {
        self.millis.get()
    }
}

impl TimeSource for MockClock {
    fn now(&self) -> Instant {
        Instant::from_millis(self.millis.get())
    }
}

/// Delay that advances the mock clock instead of sleeping.
pub struct MockDelay {
    clock: MockClock,
}

impl MockDelay {
    pub fn new(clock: &MockClock) -> Self {
        Self {
            clock: clock.clone(),
        }
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.clock.advance(ns / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.clock.advance(ms);
    }
}

// ============================================================================
// Mock Pins
// ============================================================================

/// Level shared between a mock pin and the test driving it.
#[derive(Clone)]
pub struct SharedLevel(Rc<Cell<bool>>);

impl SharedLevel {
    pub fn new(high: bool) -> Self {
        SharedLevel(Rc::new(Cell::new(high)))
    }

    pub fn set_high(&self) {
        self.0.set(true);
    }

    pub fn set_low(&self) {
        self.0.set(false);
    }

    pub fn is_high(&self) -> bool {
        self.0.get()
    }

    pub fn state(&self) -> PinState {
        PinState::from(self.0.get())
    }
}

/// Input pin reading a shared level. Can be told to fail reads.
#[derive(Clone)]
pub struct MockInput {
    level: SharedLevel,
    failing: Rc<Cell<bool>>,
}

impl MockInput {
    pub fn new(level: &SharedLevel) -> Self {
        Self {
            level: level.clone(),
            failing: Rc::new(Cell::new(false)),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }
}

impl ErrorType for MockInput {
    type Error = ErrorKind;
}

impl InputPin for MockInput {
    fn is_high(&mut self) -> Result<bool, ErrorKind> {
        if self.failing.get() {
            return Err(ErrorKind::Other);
        }
        Ok(self.level.is_high())
    }

    fn is_low(&mut self) -> Result<bool, ErrorKind> {
        self.is_high().map(|high| !high)
    }
}

/// Output pin that records every write with the mock time it happened at.
#[derive(Clone)]
pub struct MockOutput {
    level: SharedLevel,
    clock: MockClock,
    history: Rc<RefCell<Vec<(u32, PinState)>>>,
    fail_low: Rc<Cell<bool>>,
    fail_high: Rc<Cell<bool>>,
}

impl MockOutput {
    /// Creates a pin that starts high (idle for an active-low header line).
    pub fn new(clock: &MockClock) -> Self {
        Self {
            level: SharedLevel::new(true),
            clock: clock.clone(),
            history: Rc::new(RefCell::new(Vec::new())),
            fail_low: Rc::new(Cell::new(false)),
            fail_high: Rc::new(Cell::new(false)),
        }
    }

    /// Makes `set_low` report an error without changing the level.
    pub fn set_fail_low(&self, fail: bool) {
        self.fail_low.set(fail);
    }

    /// Makes `set_high` report an error without changing the level.
    pub fn set_fail_high(&self, fail: bool) {
        self.fail_high.set(fail);
    }

    pub fn state(&self) -> PinState {
        self.level.state()
    }

    /// Every successful write as (millis, level).
    pub fn history(&self) -> Vec<(u32, PinState)> {
        self.history.borrow().clone()
    }

    pub fn clear_history(&self) {
        self.history.borrow_mut().clear();
    }

    fn write(&mut self, state: PinState) {
        match state {
            PinState::High => self.level.set_high(),
            PinState::Low => self.level.set_low(),
        }
        self.history
            .borrow_mut()
            .push((self.clock.millis(), state));
    }
}

impl ErrorType for MockOutput {
    type Error = ErrorKind;
}

impl OutputPin for MockOutput {
    fn set_low(&mut self) -> Result<(), ErrorKind> {
        if self.fail_low.get() {
            return Err(ErrorKind::Other);
        }
        self.write(PinState::Low);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), ErrorKind> {
        if self.fail_high.get() {
            return Err(ErrorKind::Other);
        }
        self.write(PinState::High);
        Ok(())
    }
}

// ============================================================================
// Mock Lighting
// ============================================================================

/// Calls made on the lighting facade, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightingCall {
    SetLit(bool),
    SetEffect(EffectId),
    ResetPaletteOverride,
    RandomColor { persist: bool, notify: bool },
    NotifyStateChanged,
}

/// Lighting facade that keeps minimal state and records every call.
pub struct MockLighting {
    lit: bool,
    effect: EffectId,
    effect_count: u8,
    calls: Vec<LightingCall>,
}

impl MockLighting {
    pub fn new(lit: bool) -> Self {
        Self {
            lit,
            effect: EffectId::STATIC,
            effect_count: 4,
            calls: Vec::new(),
        }
    }

    pub fn with_effect(mut self, effect: EffectId) -> Self {
        self.effect = effect;
        self
    }

    pub fn calls(&self) -> &[LightingCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn notify_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| **call == LightingCall::NotifyStateChanged)
            .count()
    }
}

impl Lighting for MockLighting {
    fn is_lit(&self) -> bool {
        self.lit
    }

    fn set_lit(&mut self, lit: bool) {
        self.lit = lit;
        self.calls.push(LightingCall::SetLit(lit));
    }

    fn effect(&self) -> EffectId {
        self.effect
    }

    fn set_effect(&mut self, effect: EffectId) {
        self.effect = effect;
        self.calls.push(LightingCall::SetEffect(effect));
    }

    fn effect_count(&self) -> u8 {
        self.effect_count
    }

    fn reset_palette_override(&mut self) {
        self.calls.push(LightingCall::ResetPaletteOverride);
    }

    fn random_color(&mut self, persist: bool, notify: bool) {
        self.calls.push(LightingCall::RandomColor { persist, notify });
    }

    fn notify_state_changed(&mut self) {
        self.calls.push(LightingCall::NotifyStateChanged);
    }
}

// ============================================================================
// Test Helper Functions
// ============================================================================

/// Polls `step` once per `tick` milliseconds for `total` milliseconds,
/// advancing the clock before each call.
pub fn run_for<F: FnMut()>(clock: &MockClock, total: u32, tick: u32, mut step: F) {
    let mut elapsed = 0;
    while elapsed < total {
        clock.advance(tick);
        elapsed += tick;
        step();
    }
}
