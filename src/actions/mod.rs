//! Utility action contract and catalog
//!
//! Actions are stateless singletons shared by every agent. Anything an
//! action needs to remember between ticks (a chosen destination, an
//! interaction target) lives in the per-agent scratch table, never on the
//! action value itself - two agents running the same action concurrently
//! must not see each other's state.

pub mod catalog;

use ahash::AHashMap;

use crate::agent::{AgentView, ExecutionContext};
use crate::core::error::{EngineError, Result};
use crate::core::types::EntityId;

/// A candidate behavior the arbitrator can select each tick
///
/// `utility` must be a pure read of agent/world state: finite, never NaN,
/// deterministic for an unchanged snapshot. `execute` may mutate the
/// acting agent and queue cross-agent effects; when a required
/// collaborator is absent it returns 0 utility and executes as a no-op.
pub trait UtilityAction: Send + Sync {
    fn name(&self) -> &'static str;

    fn utility(&self, view: &AgentView) -> f32;

    fn execute(&self, ctx: &mut ExecutionContext);

    /// Ambient actions are available in every state, guaranteeing the
    /// arbitrator a non-empty candidate set
    fn is_ambient(&self) -> bool {
        false
    }

    /// The entity this action is currently directed at, if any; fed to
    /// the contextual influence aggregator as the optional target
    fn influence_target(&self, _view: &AgentView) -> Option<EntityId> {
        None
    }
}

/// Ordered, name-indexed set of actions shared read-only across agents
///
/// Catalog order is load-bearing: the arbitrator breaks utility ties by
/// first-seen catalog position.
pub struct ActionCatalog {
    actions: Vec<Box<dyn UtilityAction>>,
    by_name: AHashMap<&'static str, usize>,
}

impl ActionCatalog {
    pub fn new(actions: Vec<Box<dyn UtilityAction>>) -> Result<Self> {
        let mut by_name = AHashMap::with_capacity(actions.len());
        for (index, action) in actions.iter().enumerate() {
            if by_name.insert(action.name(), index).is_some() {
                return Err(EngineError::DuplicateAction(action.name().to_string()));
            }
        }
        Ok(Self { actions, by_name })
    }

    /// The full standard catalog in its documented order
    pub fn standard() -> Self {
        catalog::standard_catalog()
    }

    pub fn get(&self, index: usize) -> &dyn UtilityAction {
        self.actions[index].as_ref()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn UtilityAction> {
        self.actions.iter().map(|a| a.as_ref())
    }

    /// Availability mask for a state's named action set: the named
    /// actions plus every ambient action. An empty name list means the
    /// state does not restrict the catalog.
    pub fn availability_mask(&self, named: &[usize]) -> Vec<bool> {
        if named.is_empty() {
            return vec![true; self.actions.len()];
        }
        let mut mask: Vec<bool> = self.actions.iter().map(|a| a.is_ambient()).collect();
        for &index in named {
            if let Some(slot) = mask.get_mut(index) {
                *slot = true;
            }
        }
        mask
    }
}
