// SPDX-License-Identifier: MIT OR Apache-2.0
//! Composite reactions bound to an external target property.
//!
//! A [`TargetReaction`] wraps a reaction together with a snapshot of the
//! target's value taken at bind time. Its from/to endpoints resolve against
//! that snapshot, the live value, or an explicit override, each with an
//! additive offset. [`TargetReaction::update_values`] re-resolves the
//! endpoints and runs automatically right before every play variant, so
//! resolution always sees up-to-date state.

use crate::reaction::Reaction;
use crate::settings::ReactionSettings;
use crate::timeline::ReactionState;
use crate::value::Animatable;

/// What a from/to endpoint resolves against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferenceValue {
    /// The snapshot captured when the target was bound.
    #[default]
    StartValue,
    /// The target's live value at resolution time.
    CurrentValue,
    /// An explicit override value.
    CustomValue,
}

/// A from/to endpoint: a reference plus an additive offset.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ValueReference<T: Animatable> {
    /// What the endpoint resolves against.
    pub reference: ReferenceValue,
    /// Override used when the reference is [`ReferenceValue::CustomValue`].
    pub custom: T,
    /// Added to the resolved base value.
    pub offset: T,
}

impl<T: Animatable> ValueReference<T> {
    /// Endpoint pinned to the bind-time snapshot.
    pub fn start() -> Self {
        Self::default()
    }

    /// Endpoint following the live value.
    pub fn current() -> Self {
        Self {
            reference: ReferenceValue::CurrentValue,
            ..Self::default()
        }
    }

    /// Endpoint with an explicit value.
    pub fn custom(value: T) -> Self {
        Self {
            reference: ReferenceValue::CustomValue,
            custom: value,
            ..Self::default()
        }
    }

    /// Add an offset to the resolved value.
    pub fn with_offset(mut self, offset: T) -> Self {
        self.offset = offset;
        self
    }

    fn resolve(&self, start: T, current: T) -> T {
        let base = match self.reference {
            ReferenceValue::StartValue => start,
            ReferenceValue::CurrentValue => current,
            ReferenceValue::CustomValue => self.custom,
        };
        T::add(base, self.offset)
    }
}

/// A reaction driving an externally-owned target property.
pub struct TargetReaction<T: Animatable> {
    reaction: Reaction<T>,
    start_value: T,
    from_ref: ValueReference<T>,
    to_ref: ValueReference<T>,
}

impl<T: Animatable> Default for TargetReaction<T> {
    fn default() -> Self {
        Self::new(ReactionSettings::default())
    }
}

impl<T: Animatable> TargetReaction<T> {
    /// Create an unbound target reaction.
    pub fn new(settings: ReactionSettings) -> Self {
        Self {
            reaction: Reaction::with_settings(T::default(), T::default(), settings),
            start_value: T::default(),
            from_ref: ValueReference::start(),
            to_ref: ValueReference::start(),
        }
    }

    /// Bind the target property and capture the start snapshot.
    pub fn bind(&mut self, getter: impl Fn() -> T + 'static, setter: impl FnMut(T) + 'static) {
        self.start_value = getter();
        self.reaction.set_getter(getter);
        self.reaction.set_setter(setter);
    }

    /// The snapshot captured at bind time.
    pub fn start_value(&self) -> T {
        self.start_value
    }

    /// Re-capture the start snapshot from the live value.
    pub fn refresh_start_value(&mut self) {
        self.start_value = self.reaction.live_value();
    }

    /// Configure how the from endpoint resolves.
    pub fn set_from_reference(&mut self, reference: ValueReference<T>) {
        self.from_ref = reference;
    }

    /// Configure how the to endpoint resolves.
    pub fn set_to_reference(&mut self, reference: ValueReference<T>) {
        self.to_ref = reference;
    }

    /// The wrapped reaction.
    pub fn reaction(&self) -> &Reaction<T> {
        &self.reaction
    }

    /// Mutable access to the wrapped reaction.
    pub fn reaction_mut(&mut self) -> &mut Reaction<T> {
        &mut self.reaction
    }

    /// Timeline state.
    pub fn state(&self) -> ReactionState {
        self.reaction.state()
    }

    /// Most recently computed value.
    pub fn current_value(&self) -> T {
        self.reaction.current_value()
    }

    /// Resolve the from/to endpoints against up-to-date state.
    pub fn update_values(&mut self) {
        let current = self.reaction.live_value();
        let from = self.from_ref.resolve(self.start_value, current);
        let to = self.to_ref.resolve(self.start_value, current);
        self.reaction.set_from(from);
        self.reaction.set_to(to);
    }

    /// Resolve endpoints, then play forward.
    pub fn play(&mut self) {
        self.update_values();
        self.reaction.play();
    }

    /// Resolve endpoints, then play in reverse.
    pub fn play_reverse(&mut self) {
        self.update_values();
        self.reaction.play_reverse();
    }

    /// Resolve endpoints, then play from a progress fraction.
    pub fn play_from_progress(&mut self, from_progress: f32) {
        self.update_values();
        self.reaction.play_from_progress(from_progress);
    }

    /// Resolve endpoints, then evaluate and push a value at the progress
    /// without playing.
    pub fn set_progress_at(&mut self, progress: f32) {
        self.update_values();
        self.reaction.set_progress_at(progress);
    }

    /// Stop playback.
    pub fn stop(&mut self) {
        self.reaction.stop();
    }

    /// Advance by one heartbeat tick.
    pub fn tick(&mut self, dt: f32) {
        self.reaction.tick(dt);
    }
}

/// Opacity transitions.
pub type FadeReaction = TargetReaction<f32>;
/// Position transitions.
pub type MoveReaction = TargetReaction<[f32; 3]>;
/// Euler rotation transitions.
pub type RotateReaction = TargetReaction<[f32; 3]>;
/// Scale transitions.
pub type ScaleReaction = TargetReaction<[f32; 3]>;
