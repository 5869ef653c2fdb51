// SPDX-License-Identifier: MIT OR Apache-2.0
//! Value-independent timeline state machine.
//!
//! A [`Timeline`] tracks where a reaction is inside its duration: lifecycle
//! state, play direction, delay accumulators, loop bookkeeping, and the
//! cycle segmentation produced by the play mode. It knows nothing about the
//! value being animated; the owning reaction turns [`TickOutcome`]s into
//! interpolated values and callback invocations.

use crate::settings::MIN_DURATION;

/// Lifecycle state of a reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReactionState {
    /// Held by a pool, must not be ticked.
    Pooled,
    /// Not running.
    #[default]
    Idle,
    /// Waiting out the start delay before the first value update.
    StartDelay,
    /// Actively interpolating.
    Playing,
    /// Waiting out the delay between loop repeats.
    LoopDelay,
    /// Suspended; resume returns to the state before the pause.
    Paused,
}

impl ReactionState {
    /// Whether the reaction holds a heartbeat subscription in this state.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ReactionState::StartDelay
                | ReactionState::Playing
                | ReactionState::LoopDelay
                | ReactionState::Paused
        )
    }

    /// Whether the reaction is idle.
    pub fn is_idle(&self) -> bool {
        matches!(self, ReactionState::Idle)
    }

    /// Whether the reaction is pooled.
    pub fn is_pooled(&self) -> bool {
        matches!(self, ReactionState::Pooled)
    }
}

/// Sign applied to elapsed-time deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayDirection {
    /// Elapsed time grows.
    #[default]
    Forward,
    /// Elapsed time shrinks.
    Reverse,
}

impl PlayDirection {
    /// Delta-time multiplier for this direction.
    pub fn sign(&self) -> f32 {
        match self {
            PlayDirection::Forward => 1.0,
            PlayDirection::Reverse => -1.0,
        }
    }

    /// The opposite direction.
    pub fn reversed(&self) -> Self {
        match self {
            PlayDirection::Forward => PlayDirection::Reverse,
            PlayDirection::Reverse => PlayDirection::Forward,
        }
    }
}

/// Position inside a cycle, produced by a tick that requires a value update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CyclePosition {
    /// Index into the cycle list.
    pub cycle: usize,
    /// Raw intra-cycle progress in [0, 1], before easing.
    pub t: f32,
}

/// What a single tick produced.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickOutcome {
    /// The value must be updated at this position.
    pub sample: Option<CyclePosition>,
    /// A loop repeat begins; the loop callback fires after the value update.
    pub looped: bool,
    /// The loop budget is exhausted; stop and finish callbacks fire after
    /// the final value update.
    pub finished: bool,
}

/// Timeline state for a single reaction.
#[derive(Debug, Clone)]
pub struct Timeline {
    state: ReactionState,
    state_before_pause: ReactionState,
    direction: PlayDirection,
    duration: f32,
    elapsed: f32,
    /// Duration offset where the current run starts.
    start_elapsed: f32,
    /// Duration offset where the current run ends.
    target_elapsed: f32,
    start_delay: f32,
    elapsed_start_delay: f32,
    loops: i32,
    elapsed_loops: i32,
    loop_delay: f32,
    elapsed_loop_delay: f32,
    cycle_durations: Vec<f32>,
    current_cycle: usize,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Timeline {
    /// Create an idle timeline with a single full-length cycle.
    pub fn new(duration: f32) -> Self {
        let duration = duration.max(MIN_DURATION);
        Self {
            state: ReactionState::Idle,
            state_before_pause: ReactionState::Idle,
            direction: PlayDirection::Forward,
            duration,
            elapsed: 0.0,
            start_elapsed: 0.0,
            target_elapsed: duration,
            start_delay: 0.0,
            elapsed_start_delay: 0.0,
            loops: 0,
            elapsed_loops: 0,
            loop_delay: 0.0,
            elapsed_loop_delay: 0.0,
            cycle_durations: vec![duration],
            current_cycle: 0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ReactionState {
        self.state
    }

    /// Current play direction.
    pub fn direction(&self) -> PlayDirection {
        self.direction
    }

    /// Total duration, epsilon-clamped.
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Elapsed duration inside the timeline.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Loops completed since the last play.
    pub fn elapsed_loops(&self) -> i32 {
        self.elapsed_loops
    }

    /// Index of the cycle the playhead is in.
    pub fn current_cycle(&self) -> usize {
        self.current_cycle
    }

    /// Cycle durations for the active play mode. Their sum equals the
    /// duration.
    pub fn cycle_durations(&self) -> &[f32] {
        &self.cycle_durations
    }

    /// Overall progress in [0, 1].
    pub fn progress(&self) -> f32 {
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }

    /// Configure duration, delays, and loop counts. Clears nothing else;
    /// callers configure before playing.
    pub fn configure(&mut self, duration: f32, start_delay: f32, loops: i32, loop_delay: f32) {
        self.duration = duration.max(MIN_DURATION);
        self.start_delay = start_delay.max(0.0);
        self.loops = loops;
        self.loop_delay = loop_delay.max(0.0);
    }

    /// Replace the cycle segmentation. Durations must sum to the timeline
    /// duration; the play modes guarantee this.
    pub fn set_cycle_durations(&mut self, cycle_durations: Vec<f32>) {
        self.cycle_durations = if cycle_durations.is_empty() {
            vec![self.duration]
        } else {
            cycle_durations
        };
    }

    /// Convert a progress fraction into a duration offset, rounded to four
    /// decimals.
    pub fn duration_at_progress(&self, progress: f32) -> f32 {
        let offset = progress.clamp(0.0, 1.0) * self.duration;
        (offset * 10_000.0).round() / 10_000.0
    }

    /// Start playing over the full duration. A forward play with a start
    /// delay enters [`ReactionState::StartDelay`] first.
    pub fn play(&mut self, reverse: bool) {
        self.direction = if reverse {
            PlayDirection::Reverse
        } else {
            PlayDirection::Forward
        };
        self.elapsed_loops = 0;
        self.elapsed_loop_delay = 0.0;
        self.elapsed_start_delay = 0.0;
        match self.direction {
            PlayDirection::Forward => {
                self.start_elapsed = 0.0;
                self.target_elapsed = self.duration;
            }
            PlayDirection::Reverse => {
                self.start_elapsed = self.duration;
                self.target_elapsed = 0.0;
            }
        }
        self.elapsed = self.start_elapsed;
        self.current_cycle = self.initial_cycle();
        self.state = if self.start_delay > 0.0 && self.direction == PlayDirection::Forward {
            ReactionState::StartDelay
        } else {
            ReactionState::Playing
        };
        tracing::trace!(state = ?self.state, direction = ?self.direction, "timeline play");
    }

    /// Start playing between two progress fractions. Progress-window plays
    /// bypass the start delay entirely.
    pub fn play_window(&mut self, from_progress: f32, to_progress: f32) {
        let from = self.duration_at_progress(from_progress);
        let to = self.duration_at_progress(to_progress);
        self.direction = if to >= from {
            PlayDirection::Forward
        } else {
            PlayDirection::Reverse
        };
        self.elapsed_loops = 0;
        self.elapsed_loop_delay = 0.0;
        self.elapsed_start_delay = 0.0;
        self.start_elapsed = from;
        self.target_elapsed = to;
        self.elapsed = from;
        self.current_cycle = self.initial_cycle();
        self.state = ReactionState::Playing;
    }

    /// Stop without finishing. The reaction decides which callbacks fire.
    pub fn stop(&mut self) {
        if self.state.is_active() {
            self.state = ReactionState::Idle;
        }
    }

    /// Force the playhead to the end of the run and go idle, as the finish
    /// path does.
    pub fn complete(&mut self) {
        self.elapsed = self.target_elapsed;
        self.current_cycle = self.final_cycle();
        self.state = ReactionState::Idle;
    }

    /// Suspend an active timeline.
    pub fn pause(&mut self) -> bool {
        if !self.state.is_active() || self.state == ReactionState::Paused {
            return false;
        }
        self.state_before_pause = self.state;
        self.state = ReactionState::Paused;
        true
    }

    /// Return to the state held before the pause.
    pub fn resume(&mut self) -> bool {
        if self.state != ReactionState::Paused {
            return false;
        }
        self.state = self.state_before_pause;
        true
    }

    /// Flip the play direction in place, swapping the run bounds so the
    /// playhead now heads back toward where it came from.
    pub fn flip_direction(&mut self) {
        self.direction = self.direction.reversed();
        std::mem::swap(&mut self.start_elapsed, &mut self.target_elapsed);
    }

    /// Mark as held by a pool.
    pub fn mark_pooled(&mut self) {
        self.state = ReactionState::Pooled;
    }

    /// Return from the pool to idle.
    pub fn mark_idle(&mut self) {
        self.state = ReactionState::Idle;
    }

    /// Advance by one heartbeat tick.
    ///
    /// Pooled, idle, and paused timelines ignore the tick; delay states only
    /// advance their accumulator. A playing timeline reports the position to
    /// sample and whether a loop or finish boundary was crossed.
    pub fn tick(&mut self, dt: f32) -> TickOutcome {
        match self.state {
            ReactionState::Pooled | ReactionState::Idle | ReactionState::Paused => {
                TickOutcome::default()
            }
            ReactionState::StartDelay => {
                self.elapsed_start_delay += dt;
                if self.elapsed_start_delay >= self.start_delay {
                    self.state = ReactionState::Playing;
                }
                TickOutcome::default()
            }
            ReactionState::LoopDelay => {
                self.elapsed_loop_delay += dt;
                if self.elapsed_loop_delay >= self.loop_delay {
                    self.elapsed_loop_delay = 0.0;
                    self.restart_run();
                    self.state = ReactionState::Playing;
                    TickOutcome {
                        looped: true,
                        ..TickOutcome::default()
                    }
                } else {
                    TickOutcome::default()
                }
            }
            ReactionState::Playing => self.advance(dt),
        }
    }

    fn advance(&mut self, dt: f32) -> TickOutcome {
        let lower = self.start_elapsed.min(self.target_elapsed);
        let upper = self.start_elapsed.max(self.target_elapsed);
        self.elapsed = self.elapsed.clamp(lower, upper);

        let step = dt * self.direction.sign();
        let next = self.elapsed + step;
        let crossed = match self.direction {
            PlayDirection::Forward => next >= self.target_elapsed,
            PlayDirection::Reverse => next <= self.target_elapsed,
        };

        if !crossed {
            self.elapsed = next;
            let sample = self.locate_cycle();
            return TickOutcome {
                sample: Some(sample),
                ..TickOutcome::default()
            };
        }

        // The run ended inside this tick. Snap to the end of the run, then
        // decide between another loop and finishing.
        self.elapsed = self.target_elapsed;
        let end_sample = self.locate_cycle();
        self.elapsed_loops += 1;

        if self.loops >= 0 && self.elapsed_loops > self.loops {
            self.state = ReactionState::Idle;
            return TickOutcome {
                sample: Some(end_sample),
                finished: true,
                ..TickOutcome::default()
            };
        }

        if self.loop_delay > 0.0 {
            self.state = ReactionState::LoopDelay;
            self.elapsed_loop_delay = 0.0;
            return TickOutcome {
                sample: Some(end_sample),
                ..TickOutcome::default()
            };
        }

        self.restart_run();
        TickOutcome {
            sample: Some(end_sample),
            looped: true,
            ..TickOutcome::default()
        }
    }

    fn restart_run(&mut self) {
        self.elapsed = self.start_elapsed;
        self.current_cycle = self.initial_cycle();
    }

    fn initial_cycle(&self) -> usize {
        match self.direction {
            PlayDirection::Forward => 0,
            PlayDirection::Reverse => self.cycle_durations.len().saturating_sub(1),
        }
    }

    fn final_cycle(&self) -> usize {
        match self.direction {
            PlayDirection::Forward => self.cycle_durations.len().saturating_sub(1),
            PlayDirection::Reverse => 0,
        }
    }

    /// Cycle position for an arbitrary duration offset, without moving the
    /// playhead.
    pub fn position_at(&self, offset: f32) -> CyclePosition {
        let offset = offset.clamp(0.0, self.duration);
        let mut cumulative = 0.0;
        for (i, d) in self.cycle_durations.iter().enumerate() {
            if offset <= cumulative + d + f32::EPSILON {
                let t = if *d < f32::EPSILON {
                    1.0
                } else {
                    ((offset - cumulative) / d).clamp(0.0, 1.0)
                };
                return CyclePosition { cycle: i, t };
            }
            cumulative += d;
        }
        CyclePosition {
            cycle: self.cycle_durations.len().saturating_sub(1),
            t: 1.0,
        }
    }

    /// Find the cycle containing the playhead, walking in play direction,
    /// and update `current_cycle`.
    fn locate_cycle(&mut self) -> CyclePosition {
        match self.direction {
            PlayDirection::Forward => {
                let mut cumulative = 0.0;
                for (i, d) in self.cycle_durations.iter().enumerate() {
                    if self.elapsed <= cumulative + d + f32::EPSILON {
                        self.current_cycle = i;
                        let t = if *d < f32::EPSILON {
                            1.0
                        } else {
                            ((self.elapsed - cumulative) / d).clamp(0.0, 1.0)
                        };
                        return CyclePosition { cycle: i, t };
                    }
                    cumulative += d;
                }
            }
            PlayDirection::Reverse => {
                let mut cumulative = self.duration;
                for (i, d) in self.cycle_durations.iter().enumerate().rev() {
                    if self.elapsed >= cumulative - d - f32::EPSILON {
                        self.current_cycle = i;
                        let start = cumulative - d;
                        let t = if *d < f32::EPSILON {
                            0.0
                        } else {
                            ((self.elapsed - start) / d).clamp(0.0, 1.0)
                        };
                        return CyclePosition { cycle: i, t };
                    }
                    cumulative -= d;
                }
            }
        }
        // Rounding pushed the playhead outside every cycle; land on the
        // terminal one.
        let i = self.final_cycle();
        self.current_cycle = i;
        CyclePosition {
            cycle: i,
            t: match self.direction {
                PlayDirection::Forward => 1.0,
                PlayDirection::Reverse => 0.0,
            },
        }
    }
}
