// SPDX-License-Identifier: MIT OR Apache-2.0
//! Heartbeat clock.
//!
//! Produces the [`Tick`]s that drive reactions and flow graphs. Scaled and
//! unscaled delta time travel together so each consumer can pick its
//! channel. The engine handle is an explicitly shared value; nothing here
//! is process-global.

use kinetic_motion::{ReactorEngine, Tick};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;

/// Shared handle to a [`ReactorEngine`].
pub type SharedEngine = Arc<Mutex<ReactorEngine>>;

/// Create a fresh shared engine handle.
pub fn shared_engine() -> SharedEngine {
    Arc::new(Mutex::new(ReactorEngine::new()))
}

/// Per-frame time source.
pub struct Heartbeat {
    /// Multiplier applied to the scaled delta channel.
    pub time_scale: f32,
    last_tick: Option<Instant>,
    frame_count: u64,
    elapsed: f64,
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self::new()
    }
}

impl Heartbeat {
    /// Create a heartbeat running at normal speed.
    pub fn new() -> Self {
        Self {
            time_scale: 1.0,
            last_tick: None,
            frame_count: 0,
            elapsed: 0.0,
        }
    }

    /// Frames ticked so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Unscaled seconds accumulated so far.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Produce a tick from wall-clock time since the previous call. The
    /// first call yields a zero-delta tick.
    pub fn tick(&mut self) -> Tick {
        let now = Instant::now();
        let unscaled = match self.last_tick {
            Some(last) => now.duration_since(last).as_secs_f32(),
            None => 0.0,
        };
        self.last_tick = Some(now);
        self.advance(unscaled)
    }

    /// Produce a tick from an externally supplied delta. Used by fixed-step
    /// drivers and tests.
    pub fn tick_with(&mut self, unscaled_delta: f32) -> Tick {
        self.advance(unscaled_delta.max(0.0))
    }

    fn advance(&mut self, unscaled_delta: f32) -> Tick {
        self.frame_count += 1;
        self.elapsed += f64::from(unscaled_delta);
        Tick {
            delta: unscaled_delta * self.time_scale.max(0.0),
            unscaled_delta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_tick_has_zero_delta() {
        let mut heartbeat = Heartbeat::new();
        let tick = heartbeat.tick();
        assert_eq!(tick.unscaled_delta, 0.0);
        assert_eq!(heartbeat.frame_count(), 1);
    }

    #[test]
    fn test_time_scale_applies_to_scaled_channel_only() {
        let mut heartbeat = Heartbeat::new();
        heartbeat.time_scale = 0.5;
        let tick = heartbeat.tick_with(0.1);
        assert!((tick.delta - 0.05).abs() < 1e-6);
        assert!((tick.unscaled_delta - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_shared_engine_drives_reactions() {
        use kinetic_motion::{Reaction, ReactionSettings};

        let engine = shared_engine();
        let id = {
            let mut guard = engine.lock();
            let mut reaction = Reaction::with_settings(0.0_f32, 10.0, ReactionSettings::new(1.0));
            reaction.play();
            guard.register(reaction)
        };

        let mut heartbeat = Heartbeat::new();
        for _ in 0..5 {
            let tick = heartbeat.tick_with(0.1);
            engine.lock().tick(tick);
        }
        let guard = engine.lock();
        let value = guard.reaction::<f32>(id).unwrap().current_value();
        assert!((value - 5.0).abs() < 0.2);
    }
}
