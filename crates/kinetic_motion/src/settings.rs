// SPDX-License-Identifier: MIT OR Apache-2.0
//! Reaction configuration.

use crate::ease::Ease;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Minimum effective duration. Durations are clamped to this before any
/// progress division, so a zero-duration reaction never produces NaN.
pub const MIN_DURATION: f32 = 0.0001;

/// How a reaction's duration is segmented into cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PlayMode {
    /// One cycle from the start value to the target value.
    #[default]
    Normal,
    /// Two cycles: to the target, then back to the start value.
    PingPong,
    /// Damped oscillation around the target, settling back at the start value.
    Spring,
    /// Randomized offsets around the start value.
    Shake,
}

/// Inclusive range rolled each time settings are applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RandomRange {
    /// Lower bound.
    pub min: f32,
    /// Upper bound.
    pub max: f32,
}

impl RandomRange {
    /// Create a new range. Swapped bounds are normalized.
    pub fn new(min: f32, max: f32) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Draw a value from the range.
    pub fn roll<R: Rng>(&self, rng: &mut R) -> f32 {
        if (self.max - self.min).abs() < f32::EPSILON {
            return self.min;
        }
        rng.random_range(self.min..=self.max)
    }
}

/// Full configuration for a reaction's timeline and play mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionSettings {
    /// Cycle segmentation mode.
    pub play_mode: PlayMode,
    /// Easing applied to intra-cycle progress.
    pub ease: Ease,
    /// Total duration in seconds.
    pub duration: f32,
    /// When set, the duration is re-rolled from this range on every play.
    pub random_duration: Option<RandomRange>,
    /// Delay before the first value update, forward plays only.
    pub start_delay: f32,
    /// When set, the start delay is re-rolled on every play.
    pub random_start_delay: Option<RandomRange>,
    /// Extra loop repeats after the first run. Negative means infinite.
    pub loops: i32,
    /// Delay between loop repeats.
    pub loop_delay: f32,
    /// Tick with unscaled delta time, ignoring the global time scale.
    pub timescale_independent: bool,
    /// Oscillation density for Spring and Shake, at least 1.
    pub vibration: u32,
    /// Spring damping in [0, 1]. 1 kills the oscillation entirely.
    pub elasticity: f32,
    /// Shake amplitude as a fraction of the from-to delta.
    pub strength: f32,
    /// Taper shake cycle durations with an exponential-out curve.
    pub fade_out: bool,
    /// Seed for shake randomization and random ranges. Unset draws entropy.
    pub seed: Option<u64>,
}

impl Default for ReactionSettings {
    fn default() -> Self {
        Self {
            play_mode: PlayMode::Normal,
            ease: Ease::Linear,
            duration: 1.0,
            random_duration: None,
            start_delay: 0.0,
            random_start_delay: None,
            loops: 0,
            loop_delay: 0.0,
            timescale_independent: false,
            vibration: 10,
            elasticity: 0.1,
            strength: 1.0,
            fade_out: true,
            seed: None,
        }
    }
}

impl ReactionSettings {
    /// Create settings with the given duration and defaults everywhere else.
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            ..Self::default()
        }
    }

    /// Set the play mode.
    pub fn with_play_mode(mut self, play_mode: PlayMode) -> Self {
        self.play_mode = play_mode;
        self
    }

    /// Set the easing function.
    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    /// Set the start delay.
    pub fn with_start_delay(mut self, start_delay: f32) -> Self {
        self.start_delay = start_delay;
        self
    }

    /// Set loop count and delay between loops.
    pub fn with_loops(mut self, loops: i32, loop_delay: f32) -> Self {
        self.loops = loops;
        self.loop_delay = loop_delay;
        self
    }

    /// Set the randomization seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check field ranges.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.duration < 0.0 {
            return Err(SettingsError::NegativeDuration(self.duration));
        }
        if self.start_delay < 0.0 || self.loop_delay < 0.0 {
            return Err(SettingsError::NegativeDelay);
        }
        if self.vibration == 0 {
            return Err(SettingsError::ZeroVibration);
        }
        if !(0.0..=1.0).contains(&self.elasticity) {
            return Err(SettingsError::ElasticityOutOfRange(self.elasticity));
        }
        Ok(())
    }

    /// Effective duration for this play, re-rolling the random range if set.
    /// Always at least [`MIN_DURATION`].
    pub fn rolled_duration<R: Rng>(&self, rng: &mut R) -> f32 {
        let duration = match &self.random_duration {
            Some(range) => range.roll(rng),
            None => self.duration,
        };
        duration.max(MIN_DURATION)
    }

    /// Effective start delay for this play, re-rolling the random range if set.
    pub fn rolled_start_delay<R: Rng>(&self, rng: &mut R) -> f32 {
        let delay = match &self.random_start_delay {
            Some(range) => range.roll(rng),
            None => self.start_delay,
        };
        delay.max(0.0)
    }
}

/// Error for out-of-range settings fields.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Duration below zero.
    #[error("Duration must be non-negative, got {0}")]
    NegativeDuration(f32),

    /// Start or loop delay below zero.
    #[error("Delays must be non-negative")]
    NegativeDelay,

    /// Vibration of zero would produce no cycles.
    #[error("Vibration must be at least 1")]
    ZeroVibration,

    /// Elasticity outside [0, 1].
    #[error("Elasticity must be in [0, 1], got {0}")]
    ElasticityOutOfRange(f32),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_default_settings_valid() {
        assert!(ReactionSettings::default().validate().is_ok());
    }

    #[test]
    fn test_zero_duration_clamped() {
        let settings = ReactionSettings::new(0.0);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(settings.rolled_duration(&mut rng) >= MIN_DURATION);
    }

    #[test]
    fn test_random_duration_rolls_in_range() {
        let mut settings = ReactionSettings::new(1.0);
        settings.random_duration = Some(RandomRange::new(0.5, 2.0));
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let d = settings.rolled_duration(&mut rng);
            assert!((0.5..=2.0).contains(&d));
        }
    }

    #[test]
    fn test_swapped_range_normalized() {
        let range = RandomRange::new(2.0, -1.0);
        assert_eq!(range.min, -1.0);
        assert_eq!(range.max, 2.0);
    }

    #[test]
    fn test_validation_errors() {
        let mut settings = ReactionSettings::new(-1.0);
        assert!(settings.validate().is_err());

        settings = ReactionSettings::new(1.0);
        settings.vibration = 0;
        assert!(settings.validate().is_err());

        settings = ReactionSettings::new(1.0);
        settings.elasticity = 1.5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_serialization_round_trip() {
        let settings = ReactionSettings::new(2.5)
            .with_play_mode(PlayMode::Spring)
            .with_ease(Ease::QuadOut)
            .with_loops(3, 0.25);
        let text = ron::to_string(&settings).unwrap();
        let loaded: ReactionSettings = ron::from_str(&text).unwrap();
        assert_eq!(loaded, settings);
    }
}
