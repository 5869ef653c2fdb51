// SPDX-License-Identifier: MIT OR Apache-2.0
//! Reaction pooling.
//!
//! UI transitions create and drop reactions constantly; the pool keeps
//! recycled instances around so a `get` usually reuses an allocation. The
//! pool takes recycled reactions by value, so nothing else can touch an
//! instance while it is pooled.

use crate::reaction::Reaction;
use crate::value::Animatable;

/// Free-list of recycled reactions for one value type.
#[derive(Default)]
pub struct ReactionPool<T: Animatable> {
    items: Vec<Reaction<T>>,
}

impl<T: Animatable> ReactionPool<T> {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Number of pooled instances.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Take a reaction from the pool, or construct a fresh one. The
    /// returned instance is idle with default settings and no callbacks.
    pub fn get(&mut self) -> Reaction<T> {
        match self.items.pop() {
            Some(mut reaction) => {
                reaction.mark_idle();
                reaction
            }
            None => Reaction::default(),
        }
    }

    /// Reset a reaction and store it for reuse. Ownership transfers to the
    /// pool; the instance stays untouched until the next `get`.
    pub fn recycle(&mut self, mut reaction: Reaction<T>) {
        reaction.reset();
        reaction.mark_pooled();
        self.items.push(reaction);
    }

    /// Drop every pooled instance.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::ReactionState;

    #[test]
    fn test_round_trip_reuses_instance() {
        let mut pool: ReactionPool<f32> = ReactionPool::new();

        let mut reaction = pool.get();
        reaction.set_from(3.0);
        reaction.set_on_play(|| {});
        reaction.tags_mut().int_id = Some(7);

        pool.recycle(reaction);
        assert_eq!(pool.len(), 1);

        let reused = pool.get();
        assert_eq!(pool.len(), 0);
        // Reset effects are visible: values, tags, and state are clean.
        assert_eq!(reused.from_value(), 0.0);
        assert_eq!(reused.tags().int_id, None);
        assert_eq!(reused.state(), ReactionState::Idle);
    }

    #[test]
    fn test_pooled_state_while_held() {
        let mut pool: ReactionPool<f32> = ReactionPool::new();
        pool.recycle(Reaction::new(0.0, 1.0));
        assert_eq!(pool.items[0].state(), ReactionState::Pooled);
    }

    #[test]
    fn test_get_from_empty_pool_allocates() {
        let mut pool: ReactionPool<[f32; 3]> = ReactionPool::new();
        let reaction = pool.get();
        assert_eq!(reaction.state(), ReactionState::Idle);
    }
}
