// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animatable value types.
//!
//! Every value a reaction can drive implements [`Animatable`]: unclamped
//! interpolation plus the small amount of arithmetic the play modes need
//! (spring offsets, shake jitter, inverse interpolation).

use rand::Rng;

/// Capability trait for values a reaction can animate.
///
/// `lerp` is intentionally unclamped so Back/Elastic easing can overshoot.
pub trait Animatable: Copy + PartialEq + Default + std::fmt::Debug + 'static {
    /// Unclamped linear interpolation from `a` to `b` at `t`.
    fn lerp(a: Self, b: Self, t: f32) -> Self;

    /// Component-wise sum.
    fn add(a: Self, b: Self) -> Self;

    /// Component-wise difference `a - b`.
    fn sub(a: Self, b: Self) -> Self;

    /// Scale every component by `factor`.
    fn scale(self, factor: f32) -> Self;

    /// Magnitude of `b - a`, used for inverse interpolation.
    fn distance(a: Self, b: Self) -> f32;

    /// Random offset with each component drawn from `[-strength, +strength]`.
    fn jitter<R: Rng>(strength: Self, rng: &mut R) -> Self;
}

#[inline]
fn jitter_f32<R: Rng>(strength: f32, rng: &mut R) -> f32 {
    let s = strength.abs();
    if s == 0.0 {
        return 0.0;
    }
    rng.random_range(-s..=s)
}

impl Animatable for f32 {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        a + (b - a) * t
    }

    fn add(a: Self, b: Self) -> Self {
        a + b
    }

    fn sub(a: Self, b: Self) -> Self {
        a - b
    }

    fn scale(self, factor: f32) -> Self {
        self * factor
    }

    fn distance(a: Self, b: Self) -> f32 {
        (b - a).abs()
    }

    fn jitter<R: Rng>(strength: Self, rng: &mut R) -> Self {
        jitter_f32(strength, rng)
    }
}

/// Frame indices interpolate by truncation, matching integer frame stepping.
impl Animatable for i32 {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        (a as f32 + (b - a) as f32 * t) as i32
    }

    fn add(a: Self, b: Self) -> Self {
        a + b
    }

    fn sub(a: Self, b: Self) -> Self {
        a - b
    }

    fn scale(self, factor: f32) -> Self {
        (self as f32 * factor) as i32
    }

    fn distance(a: Self, b: Self) -> f32 {
        (b - a).abs() as f32
    }

    fn jitter<R: Rng>(strength: Self, rng: &mut R) -> Self {
        let s = strength.abs();
        if s == 0 {
            return 0;
        }
        rng.random_range(-s..=s)
    }
}

impl Animatable for [f32; 2] {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t]
    }

    fn add(a: Self, b: Self) -> Self {
        [a[0] + b[0], a[1] + b[1]]
    }

    fn sub(a: Self, b: Self) -> Self {
        [a[0] - b[0], a[1] - b[1]]
    }

    fn scale(self, factor: f32) -> Self {
        [self[0] * factor, self[1] * factor]
    }

    fn distance(a: Self, b: Self) -> f32 {
        let d = Self::sub(b, a);
        (d[0] * d[0] + d[1] * d[1]).sqrt()
    }

    fn jitter<R: Rng>(strength: Self, rng: &mut R) -> Self {
        [jitter_f32(strength[0], rng), jitter_f32(strength[1], rng)]
    }
}

impl Animatable for [f32; 3] {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        [
            a[0] + (b[0] - a[0]) * t,
            a[1] + (b[1] - a[1]) * t,
            a[2] + (b[2] - a[2]) * t,
        ]
    }

    fn add(a: Self, b: Self) -> Self {
        [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
    }

    fn sub(a: Self, b: Self) -> Self {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    fn scale(self, factor: f32) -> Self {
        [self[0] * factor, self[1] * factor, self[2] * factor]
    }

    fn distance(a: Self, b: Self) -> f32 {
        let d = Self::sub(b, a);
        (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
    }

    fn jitter<R: Rng>(strength: Self, rng: &mut R) -> Self {
        [
            jitter_f32(strength[0], rng),
            jitter_f32(strength[1], rng),
            jitter_f32(strength[2], rng),
        ]
    }
}

/// 4-component vectors double as RGBA colors.
impl Animatable for [f32; 4] {
    fn lerp(a: Self, b: Self, t: f32) -> Self {
        [
            a[0] + (b[0] - a[0]) * t,
            a[1] + (b[1] - a[1]) * t,
            a[2] + (b[2] - a[2]) * t,
            a[3] + (b[3] - a[3]) * t,
        ]
    }

    fn add(a: Self, b: Self) -> Self {
        [a[0] + b[0], a[1] + b[1], a[2] + b[2], a[3] + b[3]]
    }

    fn sub(a: Self, b: Self) -> Self {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2], a[3] - b[3]]
    }

    fn scale(self, factor: f32) -> Self {
        [
            self[0] * factor,
            self[1] * factor,
            self[2] * factor,
            self[3] * factor,
        ]
    }

    fn distance(a: Self, b: Self) -> f32 {
        let d = Self::sub(b, a);
        (d[0] * d[0] + d[1] * d[1] + d[2] * d[2] + d[3] * d[3]).sqrt()
    }

    fn jitter<R: Rng>(strength: Self, rng: &mut R) -> Self {
        [
            jitter_f32(strength[0], rng),
            jitter_f32(strength[1], rng),
            jitter_f32(strength[2], rng),
            jitter_f32(strength[3], rng),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_float_lerp_unclamped() {
        assert!((f32::lerp(0.0, 10.0, 0.5) - 5.0).abs() < 1e-6);
        assert!((f32::lerp(0.0, 10.0, 1.5) - 15.0).abs() < 1e-6);
        assert!((f32::lerp(0.0, 10.0, -0.5) + 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_int_lerp_truncates() {
        assert_eq!(i32::lerp(0, 10, 0.55), 5);
        assert_eq!(i32::lerp(0, 3, 0.99), 2);
        assert_eq!(i32::lerp(0, 3, 1.0), 3);
    }

    #[test]
    fn test_vec3_distance() {
        let a = [0.0, 0.0, 0.0];
        let b = [3.0, 4.0, 0.0];
        assert!((<[f32; 3]>::distance(a, b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_jitter_within_strength() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let v = <[f32; 2]>::jitter([2.0, 0.5], &mut rng);
            assert!(v[0].abs() <= 2.0);
            assert!(v[1].abs() <= 0.5);
        }
    }

    #[test]
    fn test_jitter_zero_strength() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(f32::jitter(0.0, &mut rng), 0.0);
        assert_eq!(i32::jitter(0, &mut rng), 0);
    }
}
