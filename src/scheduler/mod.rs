//! Tick orchestration
//!
//! One explicit `run_tick(world, dt)` drives everything; no component
//! updates itself behind the scheduler's back. Per agent and per tick the
//! order is fixed: needs advance, perception refreshes against a frozen
//! snapshot, the arbitrator picks and executes an action, then the state
//! machine advances its own timer and may change mode. Cross-agent
//! mutations queue as effects and merge after the agent loop, so a pair of
//! interacting agents can never see a half-applied update.
//!
//! Uses rayon for the perception pass when the registry is large enough
//! to pay for the threads.

use rayon::prelude::*;

use crate::agent::Agent;
use crate::core::config::BehaviorConfig;
use crate::core::types::{EntityId, Tick};
use crate::decision::{self, SwitchReason};
use crate::fsm::StateIdx;
use crate::world::{InteractionEffect, World, WorldSnapshot};

/// Events generated during one tick, for UI display and log inspection
#[derive(Debug, Clone)]
pub enum SimulationEvent {
    /// The arbitrator adopted a different action
    ActionStarted {
        agent: EntityId,
        agent_name: String,
        action: &'static str,
        /// Adjusted utility the action won with
        utility: f32,
        reason: SwitchReason,
        tick: Tick,
    },
    /// The state machine changed mode
    StateChanged {
        agent: EntityId,
        agent_name: String,
        from: String,
        to: String,
        /// True when the hard dwell timeout forced the fallback
        forced: bool,
        tick: Tick,
    },
    /// A queued social effect was merged into both participants
    InteractionApplied {
        initiator: EntityId,
        target: EntityId,
        tick: Tick,
    },
}

/// Run a single simulation tick over every registered agent
///
/// Returns the events that occurred for display; the world is left
/// consistent regardless of what individual agents did.
pub fn run_tick(world: &mut World, dt: f32) -> Vec<SimulationEvent> {
    let mut events = Vec::new();
    let tick = world.current_tick;
    let config = world.config.clone();
    let catalog = world.catalog.clone();
    let graph = world.graph.clone();

    // Needs grow before anything reacts to them
    for agent in &mut world.agents {
        if let Some(needs) = agent.caps.needs.as_mut() {
            needs.advance(dt);
        }
    }

    // Snapshot-then-iterate: perception runs against a frozen registry
    let snapshot = world.snapshot();
    refresh_perception(&mut world.agents, &snapshot, &config);

    // Decision and state machine steps, agent by agent
    let mut effects: Vec<InteractionEffect> = Vec::new();
    for agent in &mut world.agents {
        let scores = {
            let view = agent.view(&config);
            decision::score_actions(&catalog, &view)
        };

        // Arbitrate within the current mode
        let mask = agent.state.current_state().action_mask.clone();
        if let Some(outcome) = decision::arbitrate(&agent.decision, &scores, &mask, &config) {
            let switched = agent.decision.current_action != Some(outcome.index);
            agent.decision.current_action = Some(outcome.index);
            if outcome.resets_timer() {
                agent.decision.elapsed = 0.0;
            }
            if switched {
                tracing::debug!(
                    agent = %agent.name,
                    action = catalog.get(outcome.index).name(),
                    reason = ?outcome.reason,
                    "action adopted"
                );
                events.push(SimulationEvent::ActionStarted {
                    agent: agent.id,
                    agent_name: agent.name.clone(),
                    action: catalog.get(outcome.index).name(),
                    utility: scores[outcome.index],
                    reason: outcome.reason,
                    tick,
                });
            }

            catalog
                .get(outcome.index)
                .execute(&mut agent.execution_ctx(&config, tick, dt, &mut effects));
            agent.decision.elapsed += dt;
        }

        // State machine: hard timeout first, then the gated mode check
        if let Some(change) = agent.state.update(dt, config.max_state_duration) {
            push_state_event(&mut events, agent, &graph, change.from, change.to, true, tick);
            run_on_enter(agent, &catalog, &config, tick, dt, &mut effects, change.to);
        } else if let Some((target, candidate_utility)) =
            best_transition_candidate(agent, &graph, &scores)
        {
            let current_utility =
                decision::best_candidate(&scores, &agent.state.current_state().action_mask)
                    .map(|(_, utility)| utility)
                    .unwrap_or(0.0);

            if agent.state.evaluate_transition(
                candidate_utility,
                current_utility,
                config.override_utility_difference,
            ) {
                let target_name = graph.state(target).name.clone();
                if let Some(change) = agent.state.change_state(&target_name) {
                    push_state_event(&mut events, agent, &graph, change.from, change.to, false, tick);
                    run_on_enter(agent, &catalog, &config, tick, dt, &mut effects, change.to);
                }
            }
        }
    }

    // Movement: the navigation stub is the only thing that moves bodies
    for agent in &mut world.agents {
        if let Some(nav) = agent.caps.nav.as_mut() {
            let old = agent.body.position;
            let new = nav.advance(old, dt);
            if new.distance(&old) > 1e-6 {
                agent.body.facing = (new - old).normalize();
            }
            agent.body.position = new;
        }
    }

    // Post-tick merge: apply cross-agent effects serialized per pair
    apply_effects(world, effects, tick, &mut events);

    world.current_tick += 1;
    events
}

/// Refresh every agent's percepts; parallel when the registry is large
fn refresh_perception(agents: &mut [Agent], snapshot: &WorldSnapshot, config: &BehaviorConfig) {
    let refresh_one = |agent: &mut Agent| {
        let (id, position, facing) = (agent.id, agent.body.position, agent.body.facing);
        agent.perception.refresh(id, position, facing, snapshot, config);
    };

    if agents.len() >= config.parallel_threshold {
        agents.par_iter_mut().for_each(refresh_one);
    } else {
        agents.iter_mut().for_each(refresh_one);
    }
}

/// Best utility-scored transition target out of the current state;
/// ties resolve to edge declaration order
fn best_transition_candidate(
    agent: &Agent,
    graph: &crate::fsm::StateGraph,
    scores: &[f32],
) -> Option<(StateIdx, f32)> {
    let mut best: Option<(StateIdx, f32)> = None;
    for &target in agent.state.allowed_transitions() {
        let Some((_, utility)) = decision::best_candidate(scores, &graph.state(target).action_mask)
        else {
            continue;
        };
        match best {
            Some((_, best_utility)) if utility <= best_utility => {}
            _ => best = Some((target, utility)),
        }
    }
    best
}

/// Execute a state's entry actions once, right after the transition
fn run_on_enter(
    agent: &mut Agent,
    catalog: &crate::actions::ActionCatalog,
    config: &BehaviorConfig,
    tick: Tick,
    dt: f32,
    effects: &mut Vec<InteractionEffect>,
    state: StateIdx,
) {
    let on_enter = agent.state.graph().state(state).on_enter.clone();
    for index in on_enter {
        catalog
            .get(index)
            .execute(&mut agent.execution_ctx(config, tick, dt, effects));
    }
}

fn push_state_event(
    events: &mut Vec<SimulationEvent>,
    agent: &Agent,
    graph: &crate::fsm::StateGraph,
    from: StateIdx,
    to: StateIdx,
    forced: bool,
    tick: Tick,
) {
    tracing::debug!(
        agent = %agent.name,
        from = %graph.state(from).name,
        to = %graph.state(to).name,
        forced,
        "state changed"
    );
    events.push(SimulationEvent::StateChanged {
        agent: agent.id,
        agent_name: agent.name.clone(),
        from: graph.state(from).name.clone(),
        to: graph.state(to).name.clone(),
        forced,
        tick,
    });
}

/// Apply queued cross-agent effects after the agent loop
///
/// Both sides of each interaction are written here, in queue order, by the
/// single scheduler thread - a pair of simultaneous interactions cannot
/// produce a lost update.
fn apply_effects(
    world: &mut World,
    effects: Vec<InteractionEffect>,
    tick: Tick,
    events: &mut Vec<SimulationEvent>,
) {
    for effect in effects {
        match effect {
            InteractionEffect::Interact {
                initiator,
                target,
                love_hate,
                respect,
                comfort,
                significance,
            } => {
                if let Some(agent) = world.agent_mut(initiator) {
                    if let Some(relationships) = agent.caps.relationships.as_mut() {
                        relationships.update(target, love_hate, respect, comfort);
                    }
                }
                if let Some(agent) = world.agent_mut(target) {
                    if let Some(relationships) = agent.caps.relationships.as_mut() {
                        relationships.update(initiator, love_hate, respect, comfort);
                    }
                    if let Some(memory) = agent.caps.memory.as_mut() {
                        memory.record("was drawn into conversation", Some(initiator), significance, tick);
                    }
                }
                events.push(SimulationEvent::InteractionApplied {
                    initiator,
                    target,
                    tick,
                });
            }
        }
    }
}
