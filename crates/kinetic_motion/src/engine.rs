// SPDX-License-Identifier: MIT OR Apache-2.0
//! Reaction registry and tick dispatcher.
//!
//! The [`ReactorEngine`] owns registered reactions, forwards heartbeat
//! ticks to the active ones in registration order, and indexes reactions by
//! identity tags for bulk operations. It is an explicitly owned value, not
//! process state; tests and embedders can run as many isolated engines as
//! they like.

use crate::reaction::{Reaction, ReactionTags};
use crate::timeline::ReactionState;
use crate::value::Animatable;
use indexmap::IndexMap;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Unique identifier of a registered reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReactionId(pub Uuid);

impl ReactionId {
    /// Create a new random reaction ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ReactionId {
    fn default() -> Self {
        Self::new()
    }
}

/// One heartbeat tick: scaled and unscaled delta time in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Tick {
    /// Delta time with the global time scale applied.
    pub delta: f32,
    /// Raw delta time.
    pub unscaled_delta: f32,
}

impl Tick {
    /// A tick where both channels carry the same delta.
    pub fn uniform(delta: f32) -> Self {
        Self {
            delta,
            unscaled_delta: delta,
        }
    }
}

/// Object-safe view of a registered reaction.
trait ErasedReaction: Any {
    fn dispatch_tick(&mut self, tick: Tick);
    fn dispatch_stop(&mut self);
    fn is_active(&self) -> bool;
    fn state(&self) -> ReactionState;
    fn tags(&self) -> &ReactionTags;
    fn tags_mut(&mut self) -> &mut ReactionTags;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Animatable> ErasedReaction for Reaction<T> {
    fn dispatch_tick(&mut self, tick: Tick) {
        let dt = if self.is_timescale_independent() {
            tick.unscaled_delta
        } else {
            tick.delta
        };
        self.tick(dt);
    }

    fn dispatch_stop(&mut self) {
        self.stop();
    }

    fn is_active(&self) -> bool {
        Reaction::is_active(self)
    }

    fn state(&self) -> ReactionState {
        Reaction::state(self)
    }

    fn tags(&self) -> &ReactionTags {
        Reaction::tags(self)
    }

    fn tags_mut(&mut self) -> &mut ReactionTags {
        Reaction::tags_mut(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// Owns registered reactions and their identity-tag indexes.
#[derive(Default)]
pub struct ReactorEngine {
    reactions: IndexMap<ReactionId, Box<dyn ErasedReaction>>,
    by_object: HashMap<Uuid, HashSet<ReactionId>>,
    by_string: HashMap<String, HashSet<ReactionId>>,
    by_int: HashMap<i32, HashSet<ReactionId>>,
    by_target: HashMap<Uuid, HashSet<ReactionId>>,
}

impl ReactorEngine {
    /// Create an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered reactions.
    pub fn len(&self) -> usize {
        self.reactions.len()
    }

    /// Whether no reactions are registered.
    pub fn is_empty(&self) -> bool {
        self.reactions.is_empty()
    }

    /// Number of reactions currently holding a heartbeat subscription.
    pub fn active_count(&self) -> usize {
        self.reactions.values().filter(|r| r.is_active()).count()
    }

    /// Register a reaction, indexing any tags it already carries.
    pub fn register<T: Animatable>(&mut self, reaction: Reaction<T>) -> ReactionId {
        let id = ReactionId::new();
        let tags = reaction.tags().clone();
        self.reactions.insert(id, Box::new(reaction));
        self.index_tags(id, &tags);
        tracing::trace!(?id, "reaction registered");
        id
    }

    /// Remove a reaction, clearing its tag buckets.
    pub fn remove<T: Animatable>(&mut self, id: ReactionId) -> Option<Reaction<T>> {
        let entry = self.reactions.shift_remove(&id)?;
        let tags = entry.tags().clone();
        self.unindex_tags(id, &tags);
        match entry.into_any().downcast::<Reaction<T>>() {
            Ok(reaction) => Some(*reaction),
            Err(_) => None,
        }
    }

    /// Borrow a registered reaction with its concrete type.
    pub fn reaction<T: Animatable>(&self, id: ReactionId) -> Option<&Reaction<T>> {
        self.reactions.get(&id)?.as_any().downcast_ref()
    }

    /// Mutably borrow a registered reaction with its concrete type.
    pub fn reaction_mut<T: Animatable>(&mut self, id: ReactionId) -> Option<&mut Reaction<T>> {
        self.reactions.get_mut(&id)?.as_any_mut().downcast_mut()
    }

    /// Lifecycle state of a registered reaction.
    pub fn state(&self, id: ReactionId) -> Option<ReactionState> {
        self.reactions.get(&id).map(|r| r.state())
    }

    /// Forward one heartbeat tick to every active reaction, in registration
    /// order.
    pub fn tick(&mut self, tick: Tick) {
        for reaction in self.reactions.values_mut() {
            if reaction.is_active() {
                reaction.dispatch_tick(tick);
            }
        }
    }

    /// Re-tag the object id dimension. A move between buckets, never an add.
    pub fn set_object_id(&mut self, id: ReactionId, object_id: Option<Uuid>) {
        let Some(reaction) = self.reactions.get_mut(&id) else {
            return;
        };
        let previous = reaction.tags_mut().object_id.take();
        reaction.tags_mut().object_id = object_id;
        if let Some(previous) = previous {
            remove_from_bucket(&mut self.by_object, &previous, id);
        }
        if let Some(object_id) = object_id {
            self.by_object.entry(object_id).or_default().insert(id);
        }
    }

    /// Re-tag the string id dimension.
    pub fn set_string_id(&mut self, id: ReactionId, string_id: Option<String>) {
        let Some(reaction) = self.reactions.get_mut(&id) else {
            return;
        };
        let previous = reaction.tags_mut().string_id.take();
        reaction.tags_mut().string_id = string_id.clone();
        if let Some(previous) = previous {
            remove_from_bucket(&mut self.by_string, &previous, id);
        }
        if let Some(string_id) = string_id {
            self.by_string.entry(string_id).or_default().insert(id);
        }
    }

    /// Re-tag the integer id dimension.
    pub fn set_int_id(&mut self, id: ReactionId, int_id: Option<i32>) {
        let Some(reaction) = self.reactions.get_mut(&id) else {
            return;
        };
        let previous = reaction.tags_mut().int_id.take();
        reaction.tags_mut().int_id = int_id;
        if let Some(previous) = previous {
            remove_from_bucket(&mut self.by_int, &previous, id);
        }
        if let Some(int_id) = int_id {
            self.by_int.entry(int_id).or_default().insert(id);
        }
    }

    /// Re-tag the target id dimension.
    pub fn set_target_id(&mut self, id: ReactionId, target_id: Option<Uuid>) {
        let Some(reaction) = self.reactions.get_mut(&id) else {
            return;
        };
        let previous = reaction.tags_mut().target_id.take();
        reaction.tags_mut().target_id = target_id;
        if let Some(previous) = previous {
            remove_from_bucket(&mut self.by_target, &previous, id);
        }
        if let Some(target_id) = target_id {
            self.by_target.entry(target_id).or_default().insert(id);
        }
    }

    /// Stop every reaction tagged with the object id.
    pub fn stop_by_object_id(&mut self, object_id: Uuid) -> usize {
        let ids = bucket_ids(&self.by_object, &object_id);
        self.stop_ids(&ids)
    }

    /// Stop every reaction tagged with the string id.
    pub fn stop_by_string_id(&mut self, string_id: &str) -> usize {
        let ids = bucket_ids(&self.by_string, string_id);
        self.stop_ids(&ids)
    }

    /// Stop every reaction tagged with the integer id.
    pub fn stop_by_int_id(&mut self, int_id: i32) -> usize {
        let ids = bucket_ids(&self.by_int, &int_id);
        self.stop_ids(&ids)
    }

    /// Stop every reaction tagged with the target id.
    pub fn stop_by_target(&mut self, target_id: Uuid) -> usize {
        let ids = bucket_ids(&self.by_target, &target_id);
        self.stop_ids(&ids)
    }

    /// Stop every registered reaction.
    pub fn stop_all(&mut self) {
        for reaction in self.reactions.values_mut() {
            reaction.dispatch_stop();
        }
    }

    /// Drop every reaction and index. The full-reload reset.
    pub fn clear(&mut self) {
        self.reactions.clear();
        self.by_object.clear();
        self.by_string.clear();
        self.by_int.clear();
        self.by_target.clear();
        tracing::debug!("reactor engine cleared");
    }

    fn stop_ids(&mut self, ids: &[ReactionId]) -> usize {
        let mut stopped = 0;
        for id in ids {
            if let Some(reaction) = self.reactions.get_mut(id) {
                if reaction.is_active() {
                    reaction.dispatch_stop();
                    stopped += 1;
                }
            }
        }
        stopped
    }

    fn index_tags(&mut self, id: ReactionId, tags: &ReactionTags) {
        if let Some(object_id) = tags.object_id {
            self.by_object.entry(object_id).or_default().insert(id);
        }
        if let Some(string_id) = &tags.string_id {
            self.by_string.entry(string_id.clone()).or_default().insert(id);
        }
        if let Some(int_id) = tags.int_id {
            self.by_int.entry(int_id).or_default().insert(id);
        }
        if let Some(target_id) = tags.target_id {
            self.by_target.entry(target_id).or_default().insert(id);
        }
    }

    fn unindex_tags(&mut self, id: ReactionId, tags: &ReactionTags) {
        if let Some(object_id) = &tags.object_id {
            remove_from_bucket(&mut self.by_object, object_id, id);
        }
        if let Some(string_id) = &tags.string_id {
            remove_from_bucket(&mut self.by_string, string_id, id);
        }
        if let Some(int_id) = &tags.int_id {
            remove_from_bucket(&mut self.by_int, int_id, id);
        }
        if let Some(target_id) = &tags.target_id {
            remove_from_bucket(&mut self.by_target, target_id, id);
        }
    }
}

fn remove_from_bucket<K: std::hash::Hash + Eq>(
    buckets: &mut HashMap<K, HashSet<ReactionId>>,
    key: &K,
    id: ReactionId,
) {
    if let Some(bucket) = buckets.get_mut(key) {
        bucket.remove(&id);
        if bucket.is_empty() {
            buckets.remove(key);
        }
    }
}

fn bucket_ids<K, Q>(buckets: &HashMap<K, HashSet<ReactionId>>, key: &Q) -> Vec<ReactionId>
where
    K: std::hash::Hash + Eq + std::borrow::Borrow<Q>,
    Q: std::hash::Hash + Eq + ?Sized,
{
    buckets
        .get(key)
        .map(|bucket| bucket.iter().copied().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ReactionSettings;

    fn playing_float(engine: &mut ReactorEngine) -> ReactionId {
        let mut reaction = Reaction::with_settings(0.0_f32, 10.0, ReactionSettings::new(1.0));
        reaction.play();
        engine.register(reaction)
    }

    #[test]
    fn test_tick_drives_registered_reactions() {
        let mut engine = ReactorEngine::new();
        let id = playing_float(&mut engine);

        for _ in 0..5 {
            engine.tick(Tick::uniform(0.1));
        }
        let reaction = engine.reaction::<f32>(id).unwrap();
        assert!((reaction.current_value() - 5.0).abs() < 0.2);
    }

    #[test]
    fn test_timescale_independent_uses_unscaled_delta() {
        let mut engine = ReactorEngine::new();

        let mut scaled = Reaction::with_settings(0.0_f32, 10.0, ReactionSettings::new(1.0));
        scaled.play();
        let scaled_id = engine.register(scaled);

        let mut settings = ReactionSettings::new(1.0);
        settings.timescale_independent = true;
        let mut unscaled = Reaction::with_settings(0.0_f32, 10.0, settings);
        unscaled.play();
        let unscaled_id = engine.register(unscaled);

        // Time runs at half speed on the scaled channel.
        for _ in 0..5 {
            engine.tick(Tick {
                delta: 0.05,
                unscaled_delta: 0.1,
            });
        }
        let scaled_value = engine.reaction::<f32>(scaled_id).unwrap().current_value();
        let unscaled_value = engine.reaction::<f32>(unscaled_id).unwrap().current_value();
        assert!((scaled_value - 2.5).abs() < 0.2);
        assert!((unscaled_value - 5.0).abs() < 0.2);
    }

    #[test]
    fn test_typed_access_rejects_wrong_type() {
        let mut engine = ReactorEngine::new();
        let id = playing_float(&mut engine);
        assert!(engine.reaction::<f32>(id).is_some());
        assert!(engine.reaction::<[f32; 3]>(id).is_none());
    }

    #[test]
    fn test_retagging_moves_between_buckets() {
        let mut engine = ReactorEngine::new();
        let id = playing_float(&mut engine);

        engine.set_string_id(id, Some("fade".to_string()));
        assert_eq!(engine.stop_by_string_id("fade"), 1);

        // Replay, then move the tag: the old bucket must be empty.
        engine.reaction_mut::<f32>(id).unwrap().play();
        engine.set_string_id(id, Some("move".to_string()));
        assert_eq!(engine.stop_by_string_id("fade"), 0);
        assert_eq!(engine.stop_by_string_id("move"), 1);
    }

    #[test]
    fn test_bulk_stop_only_hits_bucket() {
        let mut engine = ReactorEngine::new();
        let tagged = playing_float(&mut engine);
        let untagged = playing_float(&mut engine);
        let object = Uuid::new_v4();
        engine.set_object_id(tagged, Some(object));

        engine.stop_by_object_id(object);
        assert_eq!(engine.state(tagged), Some(ReactionState::Idle));
        assert_eq!(engine.state(untagged), Some(ReactionState::Playing));
    }

    #[test]
    fn test_remove_returns_typed_reaction() {
        let mut engine = ReactorEngine::new();
        let id = playing_float(&mut engine);
        engine.set_int_id(id, Some(3));

        let reaction = engine.remove::<f32>(id);
        assert!(reaction.is_some());
        assert!(engine.is_empty());
        assert_eq!(engine.stop_by_int_id(3), 0);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut engine = ReactorEngine::new();
        let id = playing_float(&mut engine);
        engine.set_string_id(id, Some("x".to_string()));
        engine.clear();
        assert!(engine.is_empty());
        assert_eq!(engine.active_count(), 0);
    }
}
