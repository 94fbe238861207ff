//! Agent assembly
//!
//! An agent owns exactly one perception model, one decision record, and
//! one state machine, all created at spawn and destroyed with it. Optional
//! collaborators (needs, memory, relationships, navigation) are assembled
//! once at spawn into a capability struct; there is no runtime component
//! discovery. Actions that require an absent capability score 0 and no-op.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

use crate::core::config::BehaviorConfig;
use crate::core::types::{EntityId, Tick, Vec2};
use crate::decision::DecisionRecord;
use crate::fsm::{StateGraph, StateMachine};
use crate::influence::{Personality, SkillTable, TraitSet};
use crate::nav::Navigation;
use crate::needs::NeedsModel;
use crate::perception::PerceptionModel;
use crate::social::{MemoryLog, RelationshipTable};
use crate::world::InteractionEffect;

/// Physical presence: where the agent is, which way it faces, how loud
/// it currently is
#[derive(Debug, Clone)]
pub struct Body {
    pub position: Vec2,
    /// Unit forward vector
    pub facing: Vec2,
    /// Sound emission; silent agents carry None
    pub loudness: Option<f32>,
}

impl Default for Body {
    fn default() -> Self {
        Self {
            position: Vec2::default(),
            facing: Vec2::new(1.0, 0.0),
            loudness: Some(1.0),
        }
    }
}

/// Optional collaborators, assembled once at spawn
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    pub needs: Option<NeedsModel>,
    pub memory: Option<MemoryLog>,
    pub relationships: Option<RelationshipTable>,
    pub nav: Option<Navigation>,
}

/// Per-agent side-table for state the shared actions need to memoize
///
/// Shared action singletons must stay stateless; everything they would be
/// tempted to cache on themselves lives here instead, keyed to the owning
/// agent by construction.
#[derive(Debug, Clone, Default)]
pub struct ActionScratch {
    /// Destination the current movement-flavored action is working toward
    pub destination: Option<Vec2>,
    /// Interaction partner the social action last selected
    pub interact_target: Option<EntityId>,
    /// Waypoints for the patrol action, owned per agent
    pub patrol_route: Vec<Vec2>,
    pub patrol_index: usize,
}

/// One autonomous simulated entity
pub struct Agent {
    pub id: EntityId,
    pub name: String,
    pub body: Body,
    pub perception: PerceptionModel,
    pub decision: DecisionRecord,
    pub state: StateMachine,
    pub personality: Personality,
    pub traits: TraitSet,
    pub skills: SkillTable,
    pub caps: Capabilities,
    pub scratch: ActionScratch,
    /// Seeded per agent; execution-time jitter only, utilities never draw
    pub rng: ChaCha8Rng,
}

impl Agent {
    pub fn builder(name: impl Into<String>) -> AgentBuilder {
        AgentBuilder::new(name)
    }

    /// Pure read view handed to `UtilityAction::utility`
    pub fn view<'a>(&'a self, config: &'a BehaviorConfig) -> AgentView<'a> {
        AgentView {
            id: self.id,
            body: &self.body,
            perception: &self.perception,
            personality: &self.personality,
            traits: &self.traits,
            skills: &self.skills,
            needs: self.caps.needs.as_ref(),
            relationships: self.caps.relationships.as_ref(),
            scratch: &self.scratch,
            config,
        }
    }

    /// Mutable context handed to `UtilityAction::execute`
    pub fn execution_ctx<'a>(
        &'a mut self,
        config: &'a BehaviorConfig,
        tick: Tick,
        dt: f32,
        effects: &'a mut Vec<InteractionEffect>,
    ) -> ExecutionContext<'a> {
        ExecutionContext {
            id: self.id,
            tick,
            dt,
            config,
            body: &mut self.body,
            perception: &self.perception,
            needs: self.caps.needs.as_mut(),
            memory: self.caps.memory.as_mut(),
            relationships: self.caps.relationships.as_ref(),
            nav: self.caps.nav.as_mut(),
            scratch: &mut self.scratch,
            rng: &mut self.rng,
            effects,
        }
    }
}

/// Read-only snapshot of one agent for utility scoring
pub struct AgentView<'a> {
    pub id: EntityId,
    pub body: &'a Body,
    pub perception: &'a PerceptionModel,
    pub personality: &'a Personality,
    pub traits: &'a TraitSet,
    pub skills: &'a SkillTable,
    pub needs: Option<&'a NeedsModel>,
    pub relationships: Option<&'a RelationshipTable>,
    pub scratch: &'a ActionScratch,
    pub config: &'a BehaviorConfig,
}

/// Mutable access for action execution
///
/// Own-agent state mutates directly; anything touching another agent goes
/// through `effects` and is applied in the post-tick merge.
pub struct ExecutionContext<'a> {
    pub id: EntityId,
    pub tick: Tick,
    pub dt: f32,
    pub config: &'a BehaviorConfig,
    pub body: &'a mut Body,
    pub perception: &'a PerceptionModel,
    pub needs: Option<&'a mut NeedsModel>,
    pub memory: Option<&'a mut MemoryLog>,
    pub relationships: Option<&'a RelationshipTable>,
    pub nav: Option<&'a mut Navigation>,
    pub scratch: &'a mut ActionScratch,
    pub rng: &'a mut ChaCha8Rng,
    pub effects: &'a mut Vec<InteractionEffect>,
}

/// Spawn-time assembly of an agent and all its components
pub struct AgentBuilder {
    name: String,
    position: Vec2,
    facing: Vec2,
    loudness: Option<f32>,
    sight_strength: f32,
    hearing_strength: f32,
    personality: Personality,
    traits: TraitSet,
    skills: SkillTable,
    caps: Capabilities,
    patrol_route: Vec<Vec2>,
    seed: Option<u64>,
}

impl AgentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: Vec2::default(),
            facing: Vec2::new(1.0, 0.0),
            loudness: Some(1.0),
            sight_strength: 1.0,
            hearing_strength: 1.0,
            personality: Personality::default(),
            traits: TraitSet::default(),
            skills: SkillTable::default(),
            caps: Capabilities::default(),
            patrol_route: Vec::new(),
            seed: None,
        }
    }

    pub fn position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn facing(mut self, facing: Vec2) -> Self {
        self.facing = facing.normalize();
        self
    }

    pub fn loudness(mut self, loudness: Option<f32>) -> Self {
        self.loudness = loudness;
        self
    }

    pub fn senses(mut self, sight_strength: f32, hearing_strength: f32) -> Self {
        self.sight_strength = sight_strength;
        self.hearing_strength = hearing_strength;
        self
    }

    pub fn personality(mut self, personality: Personality) -> Self {
        self.personality = personality;
        self
    }

    pub fn traits(mut self, traits: TraitSet) -> Self {
        self.traits = traits;
        self
    }

    pub fn skills(mut self, skills: SkillTable) -> Self {
        self.skills = skills;
        self
    }

    pub fn with_needs(mut self, needs: NeedsModel) -> Self {
        self.caps.needs = Some(needs);
        self
    }

    pub fn with_memory(mut self) -> Self {
        self.caps.memory = Some(MemoryLog::new());
        self
    }

    pub fn with_relationships(mut self) -> Self {
        self.caps.relationships = Some(RelationshipTable::new());
        self
    }

    pub fn with_nav(mut self, speed: f32) -> Self {
        self.caps.nav = Some(Navigation::new(speed));
        self
    }

    pub fn patrol_route(mut self, route: Vec<Vec2>) -> Self {
        self.patrol_route = route;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self, graph: Arc<StateGraph>) -> Agent {
        let id = EntityId::new();
        let rng = match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::seed_from_u64(id.0.as_u128() as u64),
        };

        Agent {
            id,
            name: self.name,
            body: Body {
                position: self.position,
                facing: self.facing,
                loudness: self.loudness,
            },
            perception: PerceptionModel::new(self.sight_strength, self.hearing_strength),
            decision: DecisionRecord::default(),
            state: StateMachine::new(graph),
            personality: self.personality,
            traits: self.traits,
            skills: self.skills,
            caps: self.caps,
            scratch: ActionScratch {
                patrol_route: self.patrol_route,
                ..Default::default()
            },
            rng,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionCatalog;
    use crate::fsm::{GraphSpec, StateSpec};

    fn minimal_graph() -> Arc<StateGraph> {
        let catalog = ActionCatalog::standard();
        let spec = GraphSpec {
            initial: None,
            fallback: "default".into(),
            states: vec![StateSpec::new("default")],
        };
        Arc::new(StateGraph::build(spec, &catalog).unwrap())
    }

    #[test]
    fn test_builder_default_initializes_decision_and_state() {
        let agent = Agent::builder("test").build(minimal_graph());
        assert!(agent.decision.current_action.is_none());
        assert_eq!(agent.decision.elapsed, 0.0);
        assert_eq!(agent.state.current_state().name, "default");
    }

    #[test]
    fn test_builder_capabilities_optional() {
        let bare = Agent::builder("bare").build(minimal_graph());
        assert!(bare.caps.needs.is_none());
        assert!(bare.caps.nav.is_none());

        let full = Agent::builder("full")
            .with_needs(NeedsModel::standard())
            .with_memory()
            .with_relationships()
            .with_nav(4.0)
            .build(minimal_graph());
        assert!(full.caps.needs.is_some());
        assert!(full.caps.memory.is_some());
        assert!(full.caps.relationships.is_some());
        assert!(full.caps.nav.is_some());
    }

    #[test]
    fn test_seeded_agents_draw_identically() {
        use rand::Rng;
        let mut a = Agent::builder("a").seed(7).build(minimal_graph());
        let mut b = Agent::builder("b").seed(7).build(minimal_graph());
        let xs: Vec<f32> = (0..4).map(|_| a.rng.gen::<f32>()).collect();
        let ys: Vec<f32> = (0..4).map(|_| b.rng.gen::<f32>()).collect();
        assert_eq!(xs, ys);
    }
}
