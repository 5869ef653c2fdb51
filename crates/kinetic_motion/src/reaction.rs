// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed reactions: a timeline plus the value it drives.
//!
//! A [`Reaction`] owns a [`Timeline`], a from/to/current value triple, the
//! cycle spans produced by its play mode, an optional getter/setter pair
//! bridging to an externally-owned property, and its callbacks. All hooks
//! use the safe-invoke pattern: unset hooks are silently skipped.

use crate::ease::Ease;
use crate::settings::{PlayMode, ReactionSettings};
use crate::timeline::{CyclePosition, ReactionState, Timeline};
use crate::value::Animatable;
use rand::{rngs::StdRng, SeedableRng};
use uuid::Uuid;

/// Safe-invoke for an optional lifecycle hook.
macro_rules! fire {
    ($reaction:ident, $hook:ident) => {
        if let Some(hook) = &mut $reaction.callbacks.$hook {
            hook();
        }
    };
}

/// Reads the externally-owned property.
pub type Getter<T> = Box<dyn Fn() -> T>;
/// Writes the externally-owned property.
pub type Setter<T> = Box<dyn FnMut(T)>;
/// Parameterless lifecycle hook.
pub type Hook = Box<dyn FnMut()>;
/// Hook receiving the freshly computed value.
pub type ValueHook<T> = Box<dyn FnMut(T)>;

/// Identity tags indexing a reaction in the engine registry.
///
/// Each dimension holds at most one value at a time; re-tagging through the
/// engine moves the reaction between buckets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReactionTags {
    /// Owning object id.
    pub object_id: Option<Uuid>,
    /// Free-form string key.
    pub string_id: Option<String>,
    /// Free-form integer key.
    pub int_id: Option<i32>,
    /// Animated target object id.
    pub target_id: Option<Uuid>,
}

impl ReactionTags {
    fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Default)]
struct Callbacks<T> {
    on_play: Option<Hook>,
    on_stop: Option<Hook>,
    on_finish: Option<Hook>,
    on_loop: Option<Hook>,
    on_pause: Option<Hook>,
    on_resume: Option<Hook>,
    on_update: Option<Hook>,
    on_value_changed: Option<ValueHook<T>>,
}

impl<T> Callbacks<T> {
    fn clear(&mut self) {
        *self = Self {
            on_play: None,
            on_stop: None,
            on_finish: None,
            on_loop: None,
            on_pause: None,
            on_resume: None,
            on_update: None,
            on_value_changed: None,
        };
    }
}

/// One cycle's interpolation span.
#[derive(Debug, Clone, Copy)]
struct CycleSpan<T> {
    from: T,
    to: T,
}

/// A single animation instance driving a value of type `T`.
pub struct Reaction<T: Animatable> {
    settings: ReactionSettings,
    timeline: Timeline,
    from: T,
    to: T,
    current: T,
    cycles: Vec<CycleSpan<T>>,
    getter: Option<Getter<T>>,
    setter: Option<Setter<T>>,
    callbacks: Callbacks<T>,
    tags: ReactionTags,
    rng: StdRng,
}

impl<T: Animatable> Default for Reaction<T> {
    fn default() -> Self {
        Self::new(T::default(), T::default())
    }
}

impl<T: Animatable> Reaction<T> {
    /// Create an idle reaction with default settings.
    pub fn new(from: T, to: T) -> Self {
        Self::with_settings(from, to, ReactionSettings::default())
    }

    /// Create an idle reaction with explicit settings.
    pub fn with_settings(from: T, to: T, settings: ReactionSettings) -> Self {
        let rng = make_rng(settings.seed);
        let mut reaction = Self {
            timeline: Timeline::new(settings.duration),
            settings,
            from,
            to,
            current: from,
            cycles: Vec::new(),
            getter: None,
            setter: None,
            callbacks: Callbacks::default(),
            tags: ReactionTags::default(),
            rng,
        };
        reaction.compute_play_mode();
        reaction
    }

    /// Current settings.
    pub fn settings(&self) -> &ReactionSettings {
        &self.settings
    }

    /// Replace the settings. Takes effect on the next play; an active
    /// reaction keeps its rolled timeline until then.
    pub fn set_settings(&mut self, settings: ReactionSettings) {
        if settings.seed != self.settings.seed {
            self.rng = make_rng(settings.seed);
        }
        self.settings = settings;
    }

    /// Timeline state.
    pub fn state(&self) -> ReactionState {
        self.timeline.state()
    }

    /// Whether the reaction currently needs heartbeat ticks.
    pub fn is_active(&self) -> bool {
        self.timeline.state().is_active()
    }

    /// Borrow the timeline.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Identity tags.
    pub fn tags(&self) -> &ReactionTags {
        &self.tags
    }

    /// Mutable identity tags. When registered with an engine, tag changes
    /// must go through the engine so the buckets stay in sync.
    pub fn tags_mut(&mut self) -> &mut ReactionTags {
        &mut self.tags
    }

    /// Start value.
    pub fn from_value(&self) -> T {
        self.from
    }

    /// Target value.
    pub fn to_value(&self) -> T {
        self.to
    }

    /// Most recently computed value.
    pub fn current_value(&self) -> T {
        self.current
    }

    /// The externally-owned property's value when a getter is bound,
    /// otherwise the last computed value.
    pub fn live_value(&self) -> T {
        match &self.getter {
            Some(getter) => getter(),
            None => self.current,
        }
    }

    /// Whether this reaction ticks with unscaled delta time.
    pub fn is_timescale_independent(&self) -> bool {
        self.settings.timescale_independent
    }

    /// Inject the property getter.
    pub fn set_getter(&mut self, getter: impl Fn() -> T + 'static) {
        self.getter = Some(Box::new(getter));
    }

    /// Inject the property setter.
    pub fn set_setter(&mut self, setter: impl FnMut(T) + 'static) {
        self.setter = Some(Box::new(setter));
    }

    /// Hook invoked when playback starts.
    pub fn set_on_play(&mut self, hook: impl FnMut() + 'static) {
        self.callbacks.on_play = Some(Box::new(hook));
    }

    /// Hook invoked when playback stops, including the finish path.
    pub fn set_on_stop(&mut self, hook: impl FnMut() + 'static) {
        self.callbacks.on_stop = Some(Box::new(hook));
    }

    /// Hook invoked when the loop budget is exhausted, after the stop hook.
    pub fn set_on_finish(&mut self, hook: impl FnMut() + 'static) {
        self.callbacks.on_finish = Some(Box::new(hook));
    }

    /// Hook invoked when a loop repeat begins.
    pub fn set_on_loop(&mut self, hook: impl FnMut() + 'static) {
        self.callbacks.on_loop = Some(Box::new(hook));
    }

    /// Hook invoked on pause.
    pub fn set_on_pause(&mut self, hook: impl FnMut() + 'static) {
        self.callbacks.on_pause = Some(Box::new(hook));
    }

    /// Hook invoked on resume.
    pub fn set_on_resume(&mut self, hook: impl FnMut() + 'static) {
        self.callbacks.on_resume = Some(Box::new(hook));
    }

    /// Hook invoked once per value-updating tick.
    pub fn set_on_update(&mut self, hook: impl FnMut() + 'static) {
        self.callbacks.on_update = Some(Box::new(hook));
    }

    /// Hook receiving every newly computed value.
    pub fn set_on_value_changed(&mut self, hook: impl FnMut(T) + 'static) {
        self.callbacks.on_value_changed = Some(Box::new(hook));
    }

    /// Drop every registered hook.
    pub fn clear_callbacks(&mut self) {
        self.callbacks.clear();
    }

    /// Set the start value. While active, cycle spans are recomputed in
    /// place so the in-flight animation retargets without restarting.
    pub fn set_from(&mut self, value: T) {
        self.from = value;
        if self.is_active() {
            self.compute_play_mode();
        }
    }

    /// Add `value` to the current value and use the sum as the start value.
    pub fn set_from_relative(&mut self, value: T) {
        self.set_from(T::add(self.current, value));
    }

    /// Set the target value, retargeting in flight when active.
    pub fn set_to(&mut self, value: T) {
        self.to = value;
        if self.is_active() {
            self.compute_play_mode();
        }
    }

    /// Add `value` to the current value and use the sum as the target.
    pub fn set_to_relative(&mut self, value: T) {
        self.set_to(T::add(self.current, value));
    }

    /// Play forward from the start value.
    pub fn play(&mut self) {
        self.play_directed(false);
    }

    /// Play from the target value back to the start value.
    pub fn play_reverse(&mut self) {
        self.play_directed(true);
    }

    fn play_directed(&mut self, reverse: bool) {
        self.apply_settings();
        self.timeline.play(reverse);
        self.current = self.sample(self.timeline.position_at(self.timeline.elapsed()));
        fire!(self, on_play);
    }

    /// Play from a progress fraction to the end. Bypasses the start delay.
    pub fn play_from_progress(&mut self, from_progress: f32) {
        self.play_window(from_progress, 1.0);
    }

    /// Play from the beginning to a progress fraction. Bypasses the start
    /// delay.
    pub fn play_to_progress(&mut self, to_progress: f32) {
        self.play_window(0.0, to_progress);
    }

    /// Play between two progress fractions. Bypasses the start delay.
    pub fn play_from_to_progress(&mut self, from_progress: f32, to_progress: f32) {
        self.play_window(from_progress, to_progress);
    }

    fn play_window(&mut self, from_progress: f32, to_progress: f32) {
        self.apply_settings();
        self.timeline.play_window(from_progress, to_progress);
        self.current = self.sample(self.timeline.position_at(self.timeline.elapsed()));
        fire!(self, on_play);
    }

    /// Stop without finishing. Fires the stop hook, never the finish hook.
    pub fn stop(&mut self) {
        if !self.is_active() {
            return;
        }
        self.timeline.stop();
        fire!(self, on_stop);
    }

    /// Jump to the end of the run and fire update, stop, and finish hooks
    /// in that order.
    pub fn finish(&mut self) {
        if !self.is_active() {
            return;
        }
        self.timeline.complete();
        let position = self.timeline.position_at(self.timeline.elapsed());
        self.update_current_value(position);
        fire!(self, on_update);
        fire!(self, on_stop);
        fire!(self, on_finish);
    }

    /// Suspend. Delay accumulators and the playhead hold still until resume.
    pub fn pause(&mut self) {
        if self.timeline.pause() {
            fire!(self, on_pause);
        }
    }

    /// Resume from a pause.
    pub fn resume(&mut self) {
        if self.timeline.resume() {
            fire!(self, on_resume);
        }
    }

    /// Reverse playback.
    ///
    /// Active reactions flip direction in place, except during the start
    /// delay where reversing stops the reaction instead. An idle reaction
    /// starts playing in reverse.
    pub fn reverse(&mut self) {
        match self.timeline.state() {
            ReactionState::StartDelay => self.stop(),
            ReactionState::Playing | ReactionState::LoopDelay | ReactionState::Paused => {
                self.timeline.flip_direction();
            }
            ReactionState::Idle => self.play_reverse(),
            ReactionState::Pooled => {}
        }
    }

    /// Evaluate the value at a progress fraction and push it through the
    /// setter without starting playback.
    pub fn set_progress_at(&mut self, progress: f32) {
        let offset = self.timeline.duration_at_progress(progress);
        let position = self.timeline.position_at(offset);
        self.update_current_value(position);
    }

    /// Inverse interpolation: the progress fraction whose value is closest
    /// to `value` along the from-to segment.
    pub fn progress_at_value(&self, value: T) -> f32 {
        let span = T::distance(self.from, self.to);
        if span < f32::EPSILON {
            return 0.0;
        }
        (T::distance(self.from, value) / span).clamp(0.0, 1.0)
    }

    /// Advance by one heartbeat tick.
    pub fn tick(&mut self, dt: f32) {
        let outcome = self.timeline.tick(dt);
        if let Some(position) = outcome.sample {
            self.update_current_value(position);
            fire!(self, on_update);
        }
        if outcome.looped {
            fire!(self, on_loop);
        }
        if outcome.finished {
            fire!(self, on_stop);
            fire!(self, on_finish);
        }
    }

    /// Clear callbacks, tags, and settings back to defaults and go idle.
    /// The pool contract: a recycled reaction carries nothing over.
    pub fn reset(&mut self) {
        self.callbacks.clear();
        self.tags.clear();
        self.getter = None;
        self.setter = None;
        self.settings = ReactionSettings::default();
        self.timeline = Timeline::new(self.settings.duration);
        self.from = T::default();
        self.to = T::default();
        self.current = T::default();
        self.compute_play_mode();
    }

    /// Mark as held by a pool. Pool use only.
    pub(crate) fn mark_pooled(&mut self) {
        self.timeline.mark_pooled();
    }

    /// Return from the pool to idle. Pool use only.
    pub(crate) fn mark_idle(&mut self) {
        self.timeline.mark_idle();
    }

    /// Refresh rolled settings and cycle segmentation for a new play.
    fn apply_settings(&mut self) {
        let duration = self.settings.rolled_duration(&mut self.rng);
        let start_delay = self.settings.rolled_start_delay(&mut self.rng);
        self.timeline.configure(
            duration,
            start_delay,
            self.settings.loops,
            self.settings.loop_delay,
        );
        self.compute_play_mode();
    }

    /// Compute the cycle spans and durations for the current play mode.
    fn compute_play_mode(&mut self) {
        let duration = self.timeline.duration();
        let (spans, durations) = match self.settings.play_mode {
            PlayMode::Normal => (
                vec![CycleSpan {
                    from: self.from,
                    to: self.to,
                }],
                vec![duration],
            ),
            PlayMode::PingPong => (
                vec![
                    CycleSpan {
                        from: self.from,
                        to: self.to,
                    },
                    CycleSpan {
                        from: self.to,
                        to: self.from,
                    },
                ],
                vec![duration / 2.0, duration / 2.0],
            ),
            PlayMode::Spring => self.compute_spring(duration),
            PlayMode::Shake => self.compute_shake(duration),
        };
        self.timeline.set_cycle_durations(durations);
        self.cycles = spans;
    }

    /// Damped oscillation around the target value, settling back at the
    /// start value on the final cycle.
    fn compute_spring(&mut self, duration: f32) -> (Vec<CycleSpan<T>>, Vec<f32>) {
        let n = cycle_count(self.settings.vibration, duration, true);
        let delta = T::sub(self.to, self.from);
        let damping = 1.0 - self.settings.elasticity.clamp(0.0, 1.0);

        let mut targets = Vec::with_capacity(n);
        for i in 0..n {
            let force = (1.0 - i as f32 / n as f32) * damping;
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            targets.push(T::add(self.to, delta.scale(sign * force)));
        }
        // The spring always comes to rest where it started.
        targets[n - 1] = self.from;

        let weights: Vec<f32> = (0..n).map(|i| (i + 1) as f32 / n as f32).collect();
        let durations = normalized_durations(&weights, duration);

        (self.spans_from_targets(targets), durations)
    }

    /// Randomized offsets around the start value, every other cycle
    /// returning to rest, ending at the start value.
    fn compute_shake(&mut self, duration: f32) -> (Vec<CycleSpan<T>>, Vec<f32>) {
        let n = cycle_count(self.settings.vibration, duration, false);
        let extent = T::sub(self.to, self.from).scale(self.settings.strength);

        let mut targets = Vec::with_capacity(n);
        for i in 0..n {
            if i % 2 == 0 {
                targets.push(T::add(self.from, T::jitter(extent, &mut self.rng)));
            } else {
                targets.push(self.from);
            }
        }
        targets[n - 1] = self.from;

        let weights: Vec<f32> = if self.settings.fade_out {
            (0..n)
                .map(|i| Ease::ExpoOut.evaluate((i + 1) as f32 / n as f32).max(1e-3))
                .collect()
        } else {
            vec![1.0; n]
        };
        let durations = normalized_durations(&weights, duration);

        (self.spans_from_targets(targets), durations)
    }

    fn spans_from_targets(&self, targets: Vec<T>) -> Vec<CycleSpan<T>> {
        let mut spans = Vec::with_capacity(targets.len());
        let mut previous = self.from;
        for target in targets {
            spans.push(CycleSpan {
                from: previous,
                to: target,
            });
            previous = target;
        }
        spans
    }

    /// Value at a cycle position with easing applied. Does not touch state.
    fn sample(&self, position: CyclePosition) -> T {
        let Some(span) = self.cycles.get(position.cycle) else {
            return self.current;
        };
        let eased = self.settings.ease.evaluate(position.t);
        T::lerp(span.from, span.to, eased)
    }

    /// Interpolate at the position, store the result, push it through the
    /// setter, and fire the value-changed hook.
    fn update_current_value(&mut self, position: CyclePosition) {
        let value = self.sample(position);
        self.current = value;
        if let Some(setter) = &mut self.setter {
            setter(value);
        }
        if let Some(hook) = &mut self.callbacks.on_value_changed {
            hook(value);
        }
    }

}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Number of cycles for Spring (even) or Shake (odd) at the given density.
fn cycle_count(vibration: u32, duration: f32, even: bool) -> usize {
    let vibration = vibration.max(1) as f32;
    let mut n = ((vibration + vibration * duration) as usize).max(1);
    if even {
        if n % 2 == 1 {
            n += 1;
        }
    } else if n % 2 == 0 {
        n += 1;
    }
    n
}

/// Scale weights so the durations sum to `total` exactly, with the final
/// entry absorbing the rounding residual.
fn normalized_durations(weights: &[f32], total: f32) -> Vec<f32> {
    let sum: f32 = weights.iter().sum();
    if sum < f32::EPSILON || weights.is_empty() {
        return vec![total];
    }
    let mut durations: Vec<f32> = weights.iter().map(|w| w / sum * total).collect();
    let partial: f32 = durations[..durations.len() - 1].iter().sum();
    let last = durations.len() - 1;
    durations[last] = (total - partial).max(0.0);
    durations
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn float_reaction(duration: f32) -> Reaction<f32> {
        Reaction::with_settings(0.0, 10.0, ReactionSettings::new(duration))
    }

    #[test]
    fn test_linear_float_midpoint_and_finish() {
        let finishes = Rc::new(RefCell::new(0));
        let finishes_handle = Rc::clone(&finishes);

        let mut reaction = float_reaction(1.0);
        reaction.set_on_finish(move || *finishes_handle.borrow_mut() += 1);
        reaction.play();

        // Half a second of accumulated ticks.
        for _ in 0..5 {
            reaction.tick(0.1);
        }
        assert!(
            (reaction.current_value() - 5.0).abs() < 0.2,
            "expected ~5.0, got {}",
            reaction.current_value()
        );

        for _ in 0..5 {
            reaction.tick(0.1);
        }
        assert!((reaction.current_value() - 10.0).abs() < 1e-4);
        assert_eq!(reaction.state(), ReactionState::Idle);
        assert_eq!(*finishes.borrow(), 1);
    }

    #[test]
    fn test_setter_receives_values() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_handle = Rc::clone(&seen);

        let mut reaction = float_reaction(1.0);
        reaction.set_setter(move |v| seen_handle.borrow_mut().push(v));
        reaction.play();
        for _ in 0..10 {
            reaction.tick(0.1);
        }
        let values = seen.borrow();
        assert!(!values.is_empty());
        assert!((values.last().unwrap() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_ping_pong_returns_to_from() {
        let mut reaction = Reaction::with_settings(
            2.0_f32,
            8.0,
            ReactionSettings::new(1.0).with_play_mode(PlayMode::PingPong),
        );
        reaction.play();
        for _ in 0..25 {
            reaction.tick(0.05);
        }
        assert_eq!(reaction.state(), ReactionState::Idle);
        assert!(
            (reaction.current_value() - 2.0).abs() < 1e-3,
            "ping-pong must return to the start value, got {}",
            reaction.current_value()
        );
    }

    #[test]
    fn test_spring_cycle_durations_sum_to_duration() {
        for duration in [0.3_f32, 1.0, 2.5] {
            let mut reaction = Reaction::with_settings(
                0.0_f32,
                1.0,
                ReactionSettings::new(duration).with_play_mode(PlayMode::Spring),
            );
            reaction.play();
            let sum: f32 = reaction.timeline().cycle_durations().iter().sum();
            assert!(
                (sum - reaction.timeline().duration()).abs() < 1e-4,
                "spring cycle durations must sum to duration"
            );
            assert_eq!(reaction.timeline().cycle_durations().len() % 2, 0);
        }
    }

    #[test]
    fn test_spring_settles_at_from() {
        let mut reaction = Reaction::with_settings(
            3.0_f32,
            9.0,
            ReactionSettings::new(1.0).with_play_mode(PlayMode::Spring),
        );
        reaction.play();
        for _ in 0..200 {
            reaction.tick(0.01);
        }
        assert_eq!(reaction.state(), ReactionState::Idle);
        assert!((reaction.current_value() - 3.0).abs() < 1e-2);
    }

    #[test]
    fn test_shake_cycle_durations_sum_exactly() {
        let mut reaction = Reaction::with_settings(
            [0.0_f32, 0.0],
            [1.0, 1.0],
            ReactionSettings::new(1.7)
                .with_play_mode(PlayMode::Shake)
                .with_seed(99),
        );
        reaction.play();
        let durations = reaction.timeline().cycle_durations();
        assert_eq!(durations.len() % 2, 1, "shake forces an odd cycle count");
        let sum: f32 = durations.iter().sum();
        assert!((sum - reaction.timeline().duration()).abs() < 1e-4);
    }

    #[test]
    fn test_shake_deterministic_with_seed() {
        let make = || {
            let mut r = Reaction::with_settings(
                0.0_f32,
                1.0,
                ReactionSettings::new(1.0)
                    .with_play_mode(PlayMode::Shake)
                    .with_seed(42),
            );
            r.play();
            let mut trace = Vec::new();
            for _ in 0..20 {
                r.tick(0.05);
                trace.push(r.current_value());
            }
            trace
        };
        assert_eq!(make(), make());
    }

    #[test]
    fn test_stop_skips_finish_hook() {
        let stops = Rc::new(RefCell::new(0));
        let finishes = Rc::new(RefCell::new(0));
        let stops_handle = Rc::clone(&stops);
        let finishes_handle = Rc::clone(&finishes);

        let mut reaction = float_reaction(1.0);
        reaction.set_on_stop(move || *stops_handle.borrow_mut() += 1);
        reaction.set_on_finish(move || *finishes_handle.borrow_mut() += 1);
        reaction.play();
        reaction.tick(0.1);
        reaction.stop();

        assert_eq!(*stops.borrow(), 1);
        assert_eq!(*finishes.borrow(), 0);
    }

    #[test]
    fn test_finish_fires_stop_then_finish() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let stop_order = Rc::clone(&order);
        let finish_order = Rc::clone(&order);

        let mut reaction = float_reaction(1.0);
        reaction.set_on_stop(move || stop_order.borrow_mut().push("stop"));
        reaction.set_on_finish(move || finish_order.borrow_mut().push("finish"));
        reaction.play();
        reaction.finish();

        assert_eq!(*order.borrow(), vec!["stop", "finish"]);
        assert!((reaction.current_value() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_reverse_during_start_delay_stops() {
        let mut reaction = Reaction::with_settings(
            0.0_f32,
            10.0,
            ReactionSettings::new(1.0).with_start_delay(0.5),
        );
        reaction.play();
        assert_eq!(reaction.state(), ReactionState::StartDelay);
        reaction.reverse();
        assert_eq!(reaction.state(), ReactionState::Idle);
    }

    #[test]
    fn test_reverse_while_playing_flips() {
        let mut reaction = float_reaction(1.0);
        reaction.play();
        for _ in 0..4 {
            reaction.tick(0.1);
        }
        let mid = reaction.current_value();
        reaction.reverse();
        for _ in 0..10 {
            reaction.tick(0.1);
        }
        assert!(reaction.current_value() < mid);
        assert_eq!(reaction.state(), ReactionState::Idle);
    }

    #[test]
    fn test_retarget_in_flight() {
        let mut reaction = float_reaction(1.0);
        reaction.play();
        for _ in 0..3 {
            reaction.tick(0.1);
        }
        reaction.set_to(100.0);
        for _ in 0..7 {
            reaction.tick(0.1);
        }
        assert!((reaction.current_value() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_progress_at_value_inverse() {
        let reaction = float_reaction(1.0);
        assert!((reaction.progress_at_value(5.0) - 0.5).abs() < 1e-6);
        assert!((reaction.progress_at_value(0.0)).abs() < 1e-6);
        assert!((reaction.progress_at_value(10.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_set_progress_at_pushes_value() {
        let mut reaction = float_reaction(1.0);
        reaction.set_progress_at(0.25);
        assert!((reaction.current_value() - 2.5).abs() < 1e-3);
        assert_eq!(reaction.state(), ReactionState::Idle);
    }

    #[test]
    fn test_play_window_bypasses_start_delay() {
        let mut reaction = Reaction::with_settings(
            0.0_f32,
            10.0,
            ReactionSettings::new(1.0).with_start_delay(5.0),
        );
        reaction.play_from_progress(0.5);
        assert_eq!(reaction.state(), ReactionState::Playing);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut reaction = float_reaction(1.0);
        reaction.set_on_play(|| {});
        reaction.tags_mut().string_id = Some("fade".to_string());
        reaction.set_setter(|_| {});
        reaction.reset();

        assert_eq!(reaction.tags(), &ReactionTags::default());
        assert_eq!(reaction.from_value(), 0.0);
        assert_eq!(reaction.to_value(), 0.0);
        assert_eq!(reaction.state(), ReactionState::Idle);
    }

    #[test]
    fn test_loop_hook_counts() {
        let loops = Rc::new(RefCell::new(0));
        let loops_handle = Rc::clone(&loops);

        let mut reaction = Reaction::with_settings(
            0.0_f32,
            1.0,
            ReactionSettings::new(0.2).with_loops(2, 0.0),
        );
        reaction.set_on_loop(move || *loops_handle.borrow_mut() += 1);
        reaction.play();
        for _ in 0..20 {
            reaction.tick(0.05);
        }
        assert_eq!(reaction.state(), ReactionState::Idle);
        assert_eq!(*loops.borrow(), 2);
    }
}
