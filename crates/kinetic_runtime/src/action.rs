// SPDX-License-Identifier: MIT OR Apache-2.0
//! Signal-triggered timed actions.
//!
//! A [`TimedAction`] is an explicit state machine ticked by the heartbeat:
//! trigger, wait out the start delay, run for a duration, then cool down
//! before it can trigger again. Payloads are typed [`PortValue`]s so flow
//! graphs can feed action inputs directly; a kind mismatch is reported
//! through a `bool`, never an error.

use indexmap::IndexMap;
use kinetic_flow::PortValue;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a timed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionState {
    /// Never triggers until enabled.
    Disabled,
    /// Ready to trigger.
    #[default]
    Idle,
    /// Waiting out the delay before the run starts.
    StartDelay,
    /// Running.
    Running,
    /// Waiting out the cooldown before the next trigger.
    Cooldown,
}

impl ActionState {
    /// Whether the action is somewhere between trigger and idle.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            ActionState::StartDelay | ActionState::Running | ActionState::Cooldown
        )
    }
}

/// A named signal carrying an optional typed payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Target action name.
    pub name: String,
    /// Payload delivered to the action before triggering.
    pub payload: Option<PortValue>,
}

impl Signal {
    /// Create a payload-less signal.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: None,
        }
    }

    /// Create a signal with a payload.
    pub fn with_payload(name: impl Into<String>, payload: PortValue) -> Self {
        Self {
            name: name.into(),
            payload: Some(payload),
        }
    }
}

/// Hook invoked when an action's run phase begins.
pub type RunHook = Box<dyn FnMut(&PortValue)>;

/// A heartbeat-ticked action with start-delay, run, and cooldown phases.
pub struct TimedAction {
    /// Action name, the key signals address it by.
    pub name: String,
    state: ActionState,
    start_delay: f32,
    duration: f32,
    cooldown: f32,
    accumulator: f32,
    value: PortValue,
    run_count: u64,
    on_run: Option<RunHook>,
}

impl TimedAction {
    /// Create an action that runs instantly with no delays.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: ActionState::Idle,
            start_delay: 0.0,
            duration: 0.0,
            cooldown: 0.0,
            accumulator: 0.0,
            value: PortValue::None,
            run_count: 0,
            on_run: None,
        }
    }

    /// Set the phase timings.
    pub fn with_timing(mut self, start_delay: f32, duration: f32, cooldown: f32) -> Self {
        self.start_delay = start_delay.max(0.0);
        self.duration = duration.max(0.0);
        self.cooldown = cooldown.max(0.0);
        self
    }

    /// Current state.
    pub fn state(&self) -> ActionState {
        self.state
    }

    /// Times the run phase has started.
    pub fn run_count(&self) -> u64 {
        self.run_count
    }

    /// Current payload.
    pub fn value(&self) -> &PortValue {
        &self.value
    }

    /// Hook invoked with the payload when the run phase begins.
    pub fn set_on_run(&mut self, hook: impl FnMut(&PortValue) + 'static) {
        self.on_run = Some(Box::new(hook));
    }

    /// Disable. An in-flight action is cut short.
    pub fn disable(&mut self) {
        self.state = ActionState::Disabled;
        self.accumulator = 0.0;
    }

    /// Re-enable a disabled action.
    pub fn enable(&mut self) {
        if self.state == ActionState::Disabled {
            self.state = ActionState::Idle;
        }
    }

    /// Replace the payload if the kinds match. Returns `false` on a kind
    /// mismatch; callers must check the result.
    pub fn set_value(&mut self, value: PortValue) -> bool {
        if self.value == PortValue::None || self.value.same_kind(&value) {
            self.value = value;
            true
        } else {
            false
        }
    }

    /// Trigger the action. Returns `false` while disabled or busy, so
    /// repeated triggers during a run are idempotent.
    pub fn trigger(&mut self) -> bool {
        if self.state != ActionState::Idle {
            return false;
        }
        self.accumulator = 0.0;
        if self.start_delay > 0.0 {
            self.state = ActionState::StartDelay;
        } else {
            self.begin_run();
        }
        tracing::trace!(action = %self.name, "action triggered");
        true
    }

    /// Advance by one heartbeat tick.
    pub fn tick(&mut self, dt: f32) {
        match self.state {
            ActionState::Disabled | ActionState::Idle => {}
            ActionState::StartDelay => {
                self.accumulator += dt;
                if self.accumulator >= self.start_delay {
                    self.begin_run();
                }
            }
            ActionState::Running => {
                self.accumulator += dt;
                if self.accumulator >= self.duration {
                    self.accumulator = 0.0;
                    self.state = if self.cooldown > 0.0 {
                        ActionState::Cooldown
                    } else {
                        ActionState::Idle
                    };
                }
            }
            ActionState::Cooldown => {
                self.accumulator += dt;
                if self.accumulator >= self.cooldown {
                    self.accumulator = 0.0;
                    self.state = ActionState::Idle;
                }
            }
        }
    }

    fn begin_run(&mut self) {
        self.accumulator = 0.0;
        self.state = ActionState::Running;
        self.run_count += 1;
        if let Some(hook) = &mut self.on_run {
            hook(&self.value);
        }
    }
}

/// An ordered, named collection of timed actions.
#[derive(Default)]
pub struct ActionModule {
    /// Module name.
    pub name: String,
    actions: IndexMap<String, TimedAction>,
}

impl ActionModule {
    /// Create an empty module.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: IndexMap::new(),
        }
    }

    /// Add an action, keyed by its name.
    pub fn add_action(&mut self, action: TimedAction) {
        self.actions.insert(action.name.clone(), action);
    }

    /// Get an action by name.
    pub fn action(&self, name: &str) -> Option<&TimedAction> {
        self.actions.get(name)
    }

    /// Get a mutable action by name.
    pub fn action_mut(&mut self, name: &str) -> Option<&mut TimedAction> {
        self.actions.get_mut(name)
    }

    /// All actions in insertion order.
    pub fn actions(&self) -> impl Iterator<Item = &TimedAction> {
        self.actions.values()
    }

    /// Number of actions.
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Trigger an action by name.
    pub fn trigger(&mut self, name: &str) -> bool {
        match self.actions.get_mut(name) {
            Some(action) => action.trigger(),
            None => false,
        }
    }

    /// Deliver a signal: set the payload (when present), then trigger.
    /// Returns `false` for unknown actions, payload kind mismatches, and
    /// busy actions.
    pub fn process_signal(&mut self, signal: &Signal) -> bool {
        let Some(action) = self.actions.get_mut(&signal.name) else {
            return false;
        };
        if let Some(payload) = &signal.payload {
            if !action.set_value(payload.clone()) {
                tracing::warn!(
                    action = %signal.name,
                    "signal payload kind mismatch, signal dropped"
                );
                return false;
            }
        }
        action.trigger()
    }

    /// Advance every action by one heartbeat tick.
    pub fn tick(&mut self, dt: f32) {
        for action in self.actions.values_mut() {
            action.tick(dt);
        }
    }
}
