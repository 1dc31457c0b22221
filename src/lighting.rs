//! Interface to the ambient lighting controller.

/// Index of a lighting effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EffectId(pub u8);

impl EffectId {
    /// Solid color, the first effect.
    pub const STATIC: EffectId = EffectId(0);

    /// Next effect index, wrapping past the last of `count` effects back to
    /// [`STATIC`](Self::STATIC).
    pub fn next(self, count: u8) -> EffectId {
        match self.0.checked_add(1) {
            Some(next) if next < count => EffectId(next),
            _ => EffectId::STATIC,
        }
    }
}

/// Trait to implement for the lighting subsystem the bridge drives.
///
/// Called only from the main loop. All operations are assumed to succeed;
/// implementations handle their own failures internally.
pub trait Lighting {
    /// Returns true while the lights are on.
    fn is_lit(&self) -> bool;

    /// Turns the lights on or off.
    fn set_lit(&mut self, lit: bool);

    /// Currently selected effect.
    fn effect(&self) -> EffectId;

    /// Selects an effect.
    fn set_effect(&mut self, effect: EffectId);

    /// Number of available effects.
    fn effect_count(&self) -> u8;

    /// Drops any palette override so the effect's own palette is used.
    fn reset_palette_override(&mut self);

    /// Picks a random primary color.
    ///
    /// `persist` stores it as the saved color; `notify` propagates the change
    /// to listeners immediately.
    fn random_color(&mut self, persist: bool, notify: bool);

    /// Propagates the current state to listeners.
    fn notify_state_changed(&mut self);
}
