// SPDX-License-Identifier: MIT OR Apache-2.0
//! Runtime drivers for Kinetic.
//!
//! The thin layer between an embedding UI and the Kinetic cores:
//! - [`Heartbeat`]: the per-frame time source, with a global time scale
//! - [`FlowController`]: owns a flow graph, defers its start, forwards
//!   per-frame stages, and gates multiplayer back-navigation
//! - [`TimedAction`] / [`ActionModule`]: signal-triggered actions with
//!   start-delay, run, and cooldown phases
//!
//! The embedder owns every piece explicitly; there is no process-global
//! state to reset between scenes or tests.

pub mod action;
pub mod controller;
pub mod heartbeat;

pub use action::{ActionModule, ActionState, Signal, TimedAction};
pub use controller::{FlowController, NodeHandler};
pub use heartbeat::{shared_engine, Heartbeat, SharedEngine};

#[cfg(test)]
pub(crate) fn init_test_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinetic_flow::{FlowGraph, FlowNode};
    use kinetic_motion::{Reaction, ReactionSettings, ReactionState};

    /// Heartbeat, engine, and controller working together the way an
    /// embedding UI drives them.
    #[test]
    fn test_end_to_end_frame_loop() {
        init_test_tracing();

        let engine = shared_engine();
        let mut heartbeat = Heartbeat::new();

        let mut graph = FlowGraph::new("screens");
        graph.add_node(FlowNode::start("Start"));
        graph.add_node(FlowNode::new("Menu"));
        let mut controller = FlowController::new(graph);

        let reaction_id = {
            let mut guard = engine.lock();
            let mut fade = Reaction::with_settings(0.0_f32, 1.0, ReactionSettings::new(0.5));
            fade.play();
            guard.register(fade)
        };

        // Frame loop: heartbeat -> engine tick -> controller update.
        for _ in 0..40 {
            let tick = heartbeat.tick_with(1.0 / 60.0);
            engine.lock().tick(tick);
            controller.update(tick.delta);
        }

        assert!(controller.is_started());
        assert!(controller.set_active_node_by_name("Menu"));

        let guard = engine.lock();
        let fade = guard.reaction::<f32>(reaction_id).unwrap();
        assert_eq!(fade.state(), ReactionState::Idle);
        assert!((fade.current_value() - 1.0).abs() < 1e-4);
    }
}
