//! Perception scoring - what an agent notices and how strongly
//!
//! Every tick each agent's model is refreshed against the frozen world
//! snapshot. Vision falls off with distance and viewing angle and is cut
//! entirely by occlusion or the field-of-view boundary; audio falls off
//! with distance scaled by the emitter's loudness. The combined score is a
//! weighted sum of the two and drives attention ordering.

use ordered_float::OrderedFloat;

use crate::core::config::BehaviorConfig;
use crate::core::types::{EntityId, Vec2};
use crate::needs::NeedKind;
use crate::world::{SourceKind, WorldSnapshot};

/// Tick-scoped record of one sensed entity; recomputed on every refresh
/// and never persisted
#[derive(Debug, Clone)]
pub struct PerceivedEntity {
    pub id: EntityId,
    pub kind: SourceKind,
    pub position: Vec2,
    pub distance: f32,
    pub vision_score: f32,
    pub audio_score: f32,
    pub combined_score: f32,
    /// Need satisfactions the source advertises, copied from the snapshot
    /// so action utilities stay pure reads of the percept set
    pub advertisements: Vec<(NeedKind, f32)>,
}

/// Angle falloff: 1.0 dead ahead, linearly down to 0.0 at the
/// field-of-view half-angle, 0.0 beyond it
pub fn angle_factor(angle_to_forward: f32, field_of_view: f32) -> f32 {
    let half = field_of_view / 2.0;
    if half <= 0.0 || angle_to_forward > half {
        return 0.0;
    }
    1.0 - (angle_to_forward / half).clamp(0.0, 1.0)
}

/// One agent's senses plus its current percept set
#[derive(Debug, Clone)]
pub struct PerceptionModel {
    /// Vision gain, derived externally (genetics, species) and consumed
    /// here as a plain float
    pub sight_strength: f32,
    /// Hearing gain, likewise externally derived
    pub hearing_strength: f32,
    percepts: Vec<PerceivedEntity>,
}

impl PerceptionModel {
    pub fn new(sight_strength: f32, hearing_strength: f32) -> Self {
        Self {
            sight_strength,
            hearing_strength,
            percepts: Vec::new(),
        }
    }

    /// Recompute the percept set against a frozen snapshot
    ///
    /// Ties in combined score keep snapshot order; that ordering is an
    /// artifact of the stable sort, not a contract - callers must not
    /// rely on any particular secondary key.
    pub fn refresh(
        &mut self,
        owner: EntityId,
        position: Vec2,
        facing: Vec2,
        snapshot: &WorldSnapshot,
        config: &BehaviorConfig,
    ) {
        self.percepts.clear();

        for source in snapshot.within_radius(position, config.perception_range) {
            if source.id == owner {
                continue;
            }

            let distance = position.distance(&source.position);
            let denom = distance.max(config.distance_epsilon);

            let to_target = source.position - position;
            let angle = facing.angle_to(&to_target);
            let vision_score = if angle_factor(angle, config.field_of_view) > 0.0
                && snapshot.line_of_sight(position, source.position)
            {
                self.sight_strength * (1.0 / denom) * angle_factor(angle, config.field_of_view)
            } else {
                0.0
            };

            // Sources without audio emission score zero, never error
            let audio_score = source
                .loudness
                .map(|loudness| self.hearing_strength * loudness / denom)
                .unwrap_or(0.0);

            let combined_score =
                config.vision_weight * vision_score + config.audio_weight * audio_score;

            self.percepts.push(PerceivedEntity {
                id: source.id,
                kind: source.kind,
                position: source.position,
                distance,
                vision_score,
                audio_score,
                combined_score,
                advertisements: source.advertisements.clone(),
            });
        }

        // Stable: equal combined scores keep snapshot order
        self.percepts
            .sort_by_key(|p| std::cmp::Reverse(OrderedFloat(p.combined_score)));
    }

    /// Current percepts ordered by descending combined score; restartable
    /// and stable until the next refresh
    pub fn prioritized(&self) -> impl Iterator<Item = &PerceivedEntity> {
        self.percepts.iter()
    }

    /// Highest-attention percept, if anything is perceived at all
    pub fn top(&self) -> Option<&PerceivedEntity> {
        self.percepts.first()
    }

    /// Combined score of one perceived entity; 0.0 when not perceived
    pub fn attention_score(&self, id: EntityId) -> f32 {
        self.percepts
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.combined_score)
            .unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.percepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.percepts.is_empty()
    }
}
