//! World registry and the per-tick perception snapshot
//!
//! The registry owns every agent and perceivable object. Once per tick the
//! scheduler freezes it into a `WorldSnapshot` (positions, loudness,
//! advertisements, spatial index, occluders); the whole perception pass
//! then runs against that frozen view, so spawns and despawns can never
//! race an iteration.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::actions::ActionCatalog;
use crate::agent::Agent;
use crate::core::config::BehaviorConfig;
use crate::core::types::{EntityId, Tick, Vec2};
use crate::fsm::StateGraph;
use crate::needs::NeedKind;
use crate::spatial::SparseHashGrid;

/// What a percept source is, for actions that only target one kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    Agent,
    Object,
}

/// A non-agent perceivable: food sources, water, landmarks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldObject {
    pub id: EntityId,
    pub name: String,
    pub position: Vec2,
    /// Sound emission; objects with no audio capability carry None
    pub loudness: Option<f32>,
    /// Needs this object advertises satisfaction for, with satisfaction
    /// strength per need
    pub advertisements: Vec<(NeedKind, f32)>,
}

impl WorldObject {
    pub fn new(name: impl Into<String>, position: Vec2) -> Self {
        Self {
            id: EntityId::new(),
            name: name.into(),
            position,
            loudness: None,
            advertisements: Vec::new(),
        }
    }

    pub fn with_loudness(mut self, loudness: f32) -> Self {
        self.loudness = Some(loudness);
        self
    }

    pub fn advertising(mut self, need: NeedKind, satisfaction: f32) -> Self {
        self.advertisements.push((need, satisfaction));
        self
    }
}

/// Circular occluder used by line-of-sight tests
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Obstacle {
    pub center: Vec2,
    pub radius: f32,
}

/// One frozen perceivable entry
#[derive(Debug, Clone)]
pub struct PerceptSource {
    pub id: EntityId,
    pub kind: SourceKind,
    pub position: Vec2,
    pub loudness: Option<f32>,
    pub advertisements: Vec<(NeedKind, f32)>,
}

/// Immutable world view the perception pass runs against
pub struct WorldSnapshot {
    sources: Vec<PerceptSource>,
    grid: SparseHashGrid,
    obstacles: Vec<Obstacle>,
}

impl WorldSnapshot {
    pub fn new(sources: Vec<PerceptSource>, obstacles: Vec<Obstacle>, cell_size: f32) -> Self {
        let mut grid = SparseHashGrid::new(cell_size);
        grid.rebuild(sources.iter().enumerate().map(|(i, s)| (i, s.position)));
        Self {
            sources,
            grid,
            obstacles,
        }
    }

    /// Sources within `radius` of `center`, in registry order
    pub fn within_radius(&self, center: Vec2, radius: f32) -> impl Iterator<Item = &PerceptSource> {
        self.grid
            .query_radius(center, radius)
            .into_iter()
            .map(move |i| &self.sources[i])
    }

    /// True when the segment from `from` to `to` is not blocked by any
    /// obstacle strictly between the endpoints
    pub fn line_of_sight(&self, from: Vec2, to: Vec2) -> bool {
        !self
            .obstacles
            .iter()
            .any(|obstacle| segment_hits_circle(from, to, obstacle.center, obstacle.radius))
    }
}

/// Closest-point test between segment AB and a circle
fn segment_hits_circle(a: Vec2, b: Vec2, center: Vec2, radius: f32) -> bool {
    let ab = b - a;
    let len_sq = ab.dot(&ab);
    let t = if len_sq <= f32::EPSILON {
        0.0
    } else {
        ((center - a).dot(&ab) / len_sq).clamp(0.0, 1.0)
    };
    let closest = a + ab * t;
    center.distance(&closest) <= radius
}

/// Cross-agent mutation queued by an action and applied after the agent
/// loop, so dual updates are serialized per pair by construction
#[derive(Debug, Clone)]
pub enum InteractionEffect {
    /// Bidirectional social contact: relationship deltas applied to both
    /// parties, plus a memory entry on each
    Interact {
        initiator: EntityId,
        target: EntityId,
        love_hate: f32,
        respect: f32,
        comfort: f32,
        significance: f32,
    },
}

/// The agent registry plus shared read-only behavior definitions
pub struct World {
    pub config: BehaviorConfig,
    pub catalog: Arc<ActionCatalog>,
    pub graph: Arc<StateGraph>,
    pub agents: Vec<Agent>,
    pub objects: Vec<WorldObject>,
    pub obstacles: Vec<Obstacle>,
    pub current_tick: Tick,
}

impl World {
    pub fn new(config: BehaviorConfig, catalog: Arc<ActionCatalog>, graph: Arc<StateGraph>) -> Self {
        Self {
            config,
            catalog,
            graph,
            agents: Vec::new(),
            objects: Vec::new(),
            obstacles: Vec::new(),
            current_tick: 0,
        }
    }

    /// Register an agent; its decision and state components were
    /// default-initialized by the agent builder
    pub fn spawn(&mut self, agent: Agent) -> EntityId {
        let id = agent.id;
        self.agents.push(agent);
        id
    }

    /// Remove an agent and every component it owns
    pub fn despawn(&mut self, id: EntityId) -> bool {
        let before = self.agents.len();
        self.agents.retain(|a| a.id != id);
        self.agents.len() != before
    }

    pub fn agent(&self, id: EntityId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    pub fn agent_mut(&mut self, id: EntityId) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|a| a.id == id)
    }

    /// Freeze the registry into the snapshot the perception pass reads
    pub fn snapshot(&self) -> WorldSnapshot {
        let sources = self
            .agents
            .iter()
            .map(|agent| PerceptSource {
                id: agent.id,
                kind: SourceKind::Agent,
                position: agent.body.position,
                loudness: agent.body.loudness,
                advertisements: Vec::new(),
            })
            .chain(self.objects.iter().map(|object| PerceptSource {
                id: object.id,
                kind: SourceKind::Object,
                position: object.position,
                loudness: object.loudness,
                advertisements: object.advertisements.clone(),
            }))
            .collect();

        WorldSnapshot::new(sources, self.obstacles.clone(), self.config.grid_cell_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_hits_circle() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);
        assert!(segment_hits_circle(a, b, Vec2::new(5.0, 0.5), 1.0));
        assert!(!segment_hits_circle(a, b, Vec2::new(5.0, 3.0), 1.0));
        // Obstacle beyond the segment end does not block
        assert!(!segment_hits_circle(a, b, Vec2::new(15.0, 0.0), 1.0));
    }

    #[test]
    fn test_snapshot_line_of_sight() {
        let snapshot = WorldSnapshot::new(
            Vec::new(),
            vec![Obstacle {
                center: Vec2::new(5.0, 0.0),
                radius: 1.0,
            }],
            10.0,
        );
        assert!(!snapshot.line_of_sight(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)));
        assert!(snapshot.line_of_sight(Vec2::new(0.0, 5.0), Vec2::new(10.0, 5.0)));
    }

    #[test]
    fn test_within_radius_in_registry_order() {
        let sources = vec![
            PerceptSource {
                id: EntityId::new(),
                kind: SourceKind::Object,
                position: Vec2::new(1.0, 0.0),
                loudness: None,
                advertisements: Vec::new(),
            },
            PerceptSource {
                id: EntityId::new(),
                kind: SourceKind::Object,
                position: Vec2::new(2.0, 0.0),
                loudness: None,
                advertisements: Vec::new(),
            },
        ];
        let ids: Vec<EntityId> = sources.iter().map(|s| s.id).collect();
        let snapshot = WorldSnapshot::new(sources, Vec::new(), 10.0);

        let seen: Vec<EntityId> = snapshot
            .within_radius(Vec2::new(0.0, 0.0), 5.0)
            .map(|s| s.id)
            .collect();
        assert_eq!(seen, ids);
    }
}
