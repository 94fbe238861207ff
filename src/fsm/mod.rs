//! Behavior state machine - the authoritative mode selector
//!
//! A `StateGraph` is built once (from code or TOML), validated against the
//! action catalog, and shared read-only across every agent. Each agent
//! owns a `StateMachine` holding only its current state and dwell timer.
//!
//! The machine selects the *mode*; the arbitrator selects the concrete
//! action within it. Transitions pass a utility gate with a minimum dwell
//! time, except the hard `max_state_duration` timeout, which forces entry
//! into the designated fallback state and bypasses both the gate and the
//! edge check - it is the escape valve that keeps agents from wedging.

use ahash::AHashMap;
use serde::Deserialize;
use std::sync::Arc;

use crate::actions::ActionCatalog;
use crate::core::error::{EngineError, Result};

pub type StateIdx = usize;

/// TOML-friendly definition of one state
#[derive(Debug, Clone, Deserialize)]
pub struct StateSpec {
    pub name: String,
    /// Seconds the state must be held before the transition gate opens
    #[serde(default)]
    pub min_duration: f32,
    /// Relative importance for display/tooling; not used by the gate
    #[serde(default)]
    pub priority: f32,
    /// Names of states reachable from this one
    #[serde(default)]
    pub transitions: Vec<String>,
    /// Actions the arbitrator may pick while this state is current;
    /// empty means unrestricted
    #[serde(default)]
    pub actions: Vec<String>,
    /// Actions executed once on entering this state
    #[serde(default)]
    pub on_enter: Vec<String>,
}

impl StateSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_duration: 0.0,
            priority: 0.0,
            transitions: Vec::new(),
            actions: Vec::new(),
            on_enter: Vec::new(),
        }
    }

    pub fn min_duration(mut self, seconds: f32) -> Self {
        self.min_duration = seconds;
        self
    }

    pub fn priority(mut self, priority: f32) -> Self {
        self.priority = priority;
        self
    }

    pub fn transitions(mut self, names: &[&str]) -> Self {
        self.transitions = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn actions(mut self, names: &[&str]) -> Self {
        self.actions = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn on_enter(mut self, names: &[&str]) -> Self {
        self.on_enter = names.iter().map(|s| s.to_string()).collect();
        self
    }
}

/// TOML-friendly definition of the whole graph
#[derive(Debug, Clone, Deserialize)]
pub struct GraphSpec {
    /// Starting state; absent or unknown names fall back to the first
    /// defined state
    pub initial: Option<String>,
    /// Hard-timeout refuge; must name a defined state
    pub fallback: String,
    pub states: Vec<StateSpec>,
}

/// One validated state, indices resolved against graph and catalog
#[derive(Debug, Clone)]
pub struct StateNode {
    pub name: String,
    pub min_duration: f32,
    pub priority: f32,
    pub transitions: Vec<StateIdx>,
    /// Catalog availability mask while this state is current
    pub action_mask: Vec<bool>,
    /// Catalog indices executed once on entry
    pub on_enter: Vec<usize>,
}

/// Immutable, validated transition graph shared across agents
#[derive(Debug)]
pub struct StateGraph {
    states: Vec<StateNode>,
    by_name: AHashMap<String, StateIdx>,
    initial: StateIdx,
    fallback: StateIdx,
}

impl StateGraph {
    /// Validate and resolve a spec against the action catalog
    pub fn build(spec: GraphSpec, catalog: &ActionCatalog) -> Result<Self> {
        if spec.states.is_empty() {
            return Err(EngineError::EmptyStateGraph);
        }

        let mut by_name = AHashMap::with_capacity(spec.states.len());
        for (index, state) in spec.states.iter().enumerate() {
            if by_name.insert(state.name.clone(), index).is_some() {
                return Err(EngineError::DuplicateState(state.name.clone()));
            }
        }

        let resolve_action = |name: &str| -> Result<usize> {
            catalog
                .index_of(name)
                .ok_or_else(|| EngineError::UnknownAction(name.to_string()))
        };

        let mut states = Vec::with_capacity(spec.states.len());
        for state in &spec.states {
            let transitions = state
                .transitions
                .iter()
                .map(|name| {
                    by_name
                        .get(name)
                        .copied()
                        .ok_or_else(|| EngineError::UnknownState(name.clone()))
                })
                .collect::<Result<Vec<_>>>()?;

            let named = state
                .actions
                .iter()
                .map(|name| resolve_action(name))
                .collect::<Result<Vec<_>>>()?;

            let on_enter = state
                .on_enter
                .iter()
                .map(|name| resolve_action(name))
                .collect::<Result<Vec<_>>>()?;

            states.push(StateNode {
                name: state.name.clone(),
                min_duration: state.min_duration,
                priority: state.priority,
                transitions,
                action_mask: catalog.availability_mask(&named),
                on_enter,
            });
        }

        let fallback = by_name
            .get(&spec.fallback)
            .copied()
            .ok_or_else(|| EngineError::UnknownState(spec.fallback.clone()))?;

        let initial = match &spec.initial {
            Some(name) => match by_name.get(name) {
                Some(&index) => index,
                None => {
                    tracing::warn!(initial = %name, "configured initial state unknown, using first defined state");
                    0
                }
            },
            None => 0,
        };

        Ok(Self {
            states,
            by_name,
            initial,
            fallback,
        })
    }

    pub fn from_toml_str(text: &str, catalog: &ActionCatalog) -> Result<Self> {
        let spec: GraphSpec = toml::from_str(text)?;
        Self::build(spec, catalog)
    }

    pub fn state(&self, index: StateIdx) -> &StateNode {
        &self.states[index]
    }

    pub fn index_of(&self, name: &str) -> Option<StateIdx> {
        self.by_name.get(name).copied()
    }

    pub fn initial(&self) -> StateIdx {
        self.initial
    }

    pub fn fallback(&self) -> StateIdx {
        self.fallback
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Notification payload for state-change observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChanged {
    pub from: StateIdx,
    pub to: StateIdx,
    /// True when the change came from the hard dwell-time timeout
    pub forced: bool,
}

/// Per-agent state machine: current state plus dwell timer
#[derive(Debug, Clone)]
pub struct StateMachine {
    graph: Arc<StateGraph>,
    current: StateIdx,
    elapsed: f32,
}

impl StateMachine {
    pub fn new(graph: Arc<StateGraph>) -> Self {
        let current = graph.initial();
        Self {
            graph,
            current,
            elapsed: 0.0,
        }
    }

    pub fn graph(&self) -> &StateGraph {
        &self.graph
    }

    pub fn current(&self) -> StateIdx {
        self.current
    }

    pub fn current_state(&self) -> &StateNode {
        self.graph.state(self.current)
    }

    /// Seconds spent in the current state
    pub fn state_timer(&self) -> f32 {
        self.elapsed
    }

    /// Outgoing edges of the current state
    pub fn allowed_transitions(&self) -> &[StateIdx] {
        &self.current_state().transitions
    }

    /// Advisory gate: may the machine leave the current state for a
    /// candidate with the given utility? Mutates nothing.
    pub fn evaluate_transition(
        &self,
        candidate_utility: f32,
        current_utility: f32,
        override_utility_difference: f32,
    ) -> bool {
        self.elapsed >= self.current_state().min_duration
            && (candidate_utility - current_utility) >= override_utility_difference
    }

    /// Transition to a named state
    ///
    /// Unknown targets and targets missing from the current state's edge
    /// set are logged and ignored; a self-transition is a silent no-op
    /// (no timer reset, no notification).
    pub fn change_state(&mut self, target: &str) -> Option<StateChanged> {
        let Some(index) = self.graph.index_of(target) else {
            tracing::warn!(state = %target, "change_state: unknown state");
            return None;
        };

        if index == self.current {
            return None;
        }

        if !self.current_state().transitions.contains(&index) {
            tracing::warn!(
                from = %self.current_state().name,
                to = %target,
                "change_state: transition not allowed"
            );
            return None;
        }

        Some(self.enter(index, false))
    }

    /// Advance the dwell timer; on hard timeout, force the fallback state
    /// regardless of gates or edges
    pub fn update(&mut self, dt: f32, max_state_duration: f32) -> Option<StateChanged> {
        self.elapsed += dt;

        if self.elapsed >= max_state_duration && self.current != self.graph.fallback() {
            tracing::debug!(
                from = %self.current_state().name,
                "state dwell timeout, forcing fallback"
            );
            let fallback = self.graph.fallback();
            return Some(self.enter(fallback, true));
        }

        None
    }

    fn enter(&mut self, index: StateIdx, forced: bool) -> StateChanged {
        let from = self.current;
        self.current = index;
        self.elapsed = 0.0;
        StateChanged {
            from,
            to: index,
            forced,
        }
    }
}
