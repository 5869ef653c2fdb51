// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame-index reactions.
//!
//! Animates an integer index over an owned content list (sprite frames,
//! texture frames). The index is clamped to the playable range on every
//! read, so easing overshoot can never index out of bounds.

use crate::reaction::Reaction;
use crate::settings::ReactionSettings;
use crate::timeline::ReactionState;

/// An integer reaction over a content list of `C`.
pub struct FrameReaction<C> {
    reaction: Reaction<i32>,
    frames: Vec<C>,
    first_frame: i32,
    last_frame: i32,
}

impl<C> FrameReaction<C> {
    /// Create a reaction spanning the whole content list.
    pub fn new(frames: Vec<C>) -> Self {
        Self::with_settings(frames, ReactionSettings::default())
    }

    /// Create a reaction with explicit settings.
    pub fn with_settings(frames: Vec<C>, settings: ReactionSettings) -> Self {
        let last_frame = frames.len().saturating_sub(1) as i32;
        Self {
            reaction: Reaction::with_settings(0, last_frame, settings),
            frames,
            first_frame: 0,
            last_frame,
        }
    }

    /// The content list.
    pub fn frames(&self) -> &[C] {
        &self.frames
    }

    /// Number of frames.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// First playable frame index.
    pub fn first_frame(&self) -> i32 {
        self.first_frame
    }

    /// Last playable frame index.
    pub fn last_frame(&self) -> i32 {
        self.last_frame
    }

    /// Timeline state.
    pub fn state(&self) -> ReactionState {
        self.reaction.state()
    }

    /// The underlying integer reaction.
    pub fn reaction(&self) -> &Reaction<i32> {
        &self.reaction
    }

    /// Mutable access to the underlying integer reaction.
    pub fn reaction_mut(&mut self) -> &mut Reaction<i32> {
        &mut self.reaction
    }

    /// Replace the content list. The playable range resets to the full
    /// list; the index snaps to frame zero unless `keep_position` is set,
    /// in which case it is clamped into the new range.
    pub fn set_frames(&mut self, frames: Vec<C>, keep_position: bool) {
        self.frames = frames;
        self.first_frame = 0;
        self.last_frame = self.frames.len().saturating_sub(1) as i32;
        self.reaction.stop();
        if keep_position {
            let clamped = self.current_frame();
            self.reaction.set_from(clamped);
        } else {
            self.reaction.set_from(0);
        }
        self.reaction.set_to(self.last_frame);
    }

    /// Swap two frames in place.
    pub fn swap_frames(&mut self, a: usize, b: usize) {
        if a < self.frames.len() && b < self.frames.len() {
            self.frames.swap(a, b);
        }
    }

    /// Restrict the playable range. Bounds are clamped to the content list
    /// and normalized so `first <= last`.
    pub fn set_frame_range(&mut self, first: i32, last: i32) {
        let max = self.frames.len().saturating_sub(1) as i32;
        let first = first.clamp(0, max);
        let last = last.clamp(0, max);
        self.first_frame = first.min(last);
        self.last_frame = first.max(last);
    }

    /// Play forward across the playable range.
    pub fn play(&mut self) {
        self.reaction.set_from(self.first_frame);
        self.reaction.set_to(self.last_frame);
        self.reaction.play();
    }

    /// Play backward across the playable range.
    pub fn play_reverse(&mut self) {
        self.reaction.set_from(self.first_frame);
        self.reaction.set_to(self.last_frame);
        self.reaction.play_reverse();
    }

    /// Stop playback.
    pub fn stop(&mut self) {
        self.reaction.stop();
    }

    /// Advance by one heartbeat tick.
    pub fn tick(&mut self, dt: f32) {
        self.reaction.tick(dt);
    }

    /// Jump to a specific frame without playing.
    pub fn set_frame(&mut self, frame: i32) {
        let clamped = frame.clamp(self.first_frame, self.last_frame);
        let progress = self.reaction.progress_at_value(clamped);
        self.reaction.set_progress_at(progress);
    }

    /// Current frame index, clamped to the playable range.
    pub fn current_frame(&self) -> i32 {
        self.reaction
            .current_value()
            .clamp(self.first_frame, self.last_frame)
    }

    /// Content at the current frame.
    pub fn current_content(&self) -> Option<&C> {
        self.frames.get(self.current_frame() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named_frames(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("frame_{i}")).collect()
    }

    #[test]
    fn test_plays_across_full_range() {
        let mut frames = FrameReaction::with_settings(named_frames(5), ReactionSettings::new(1.0));
        frames.play();
        for _ in 0..10 {
            frames.tick(0.1);
        }
        assert_eq!(frames.current_frame(), 4);
        assert_eq!(frames.current_content().map(String::as_str), Some("frame_4"));
    }

    #[test]
    fn test_replace_content_resets_range() {
        let mut frames = FrameReaction::new(named_frames(10));
        frames.set_frame_range(2, 7);
        frames.set_frames(named_frames(3), false);

        assert_eq!(frames.first_frame(), 0);
        assert_eq!(frames.last_frame(), 2);
        assert_eq!(frames.current_frame(), 0);
    }

    #[test]
    fn test_range_clamps_current() {
        let mut frames = FrameReaction::with_settings(named_frames(10), ReactionSettings::new(1.0));
        frames.play();
        for _ in 0..10 {
            frames.tick(0.1);
        }
        assert_eq!(frames.current_frame(), 9);

        frames.set_frame_range(0, 4);
        assert_eq!(frames.current_frame(), 4, "index clamps into the range");
    }

    #[test]
    fn test_swapped_range_normalized() {
        let mut frames = FrameReaction::new(named_frames(10));
        frames.set_frame_range(8, 3);
        assert_eq!(frames.first_frame(), 3);
        assert_eq!(frames.last_frame(), 8);
    }

    #[test]
    fn test_set_frame_jumps() {
        let mut frames = FrameReaction::new(named_frames(6));
        frames.set_frame(3);
        assert_eq!(frames.current_frame(), 3);

        frames.set_frame(100);
        assert_eq!(frames.current_frame(), 5);
    }
}
