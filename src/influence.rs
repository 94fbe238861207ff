//! Contextual influence aggregation
//!
//! Folds four independent read-only sources - traits, personality, skills,
//! relationships - into a single scalar bias per candidate action. The
//! arbitrator applies it as `adjusted = base * (1 + influence)`. Nothing
//! here mutates any input.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::config::BehaviorConfig;
use crate::core::types::EntityId;
use crate::social::RelationshipTable;
use crate::social::relationship::RelationshipCategory;

/// Modifier key traits use to bias decisions
pub const DECISION_INFLUENCE: &str = "DecisionInfluence";

/// A named trait with arbitrary scalar modifiers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterTrait {
    pub name: String,
    pub modifiers: AHashMap<String, f32>,
}

impl CharacterTrait {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modifiers: AHashMap::new(),
        }
    }

    pub fn with_modifier(mut self, key: impl Into<String>, value: f32) -> Self {
        self.modifiers.insert(key.into(), value);
        self
    }
}

/// Read-only set of traits an agent carries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraitSet {
    pub traits: Vec<CharacterTrait>,
}

impl TraitSet {
    pub fn new(traits: Vec<CharacterTrait>) -> Self {
        Self { traits }
    }

    /// Sum of every trait's decision-influence modifier
    pub fn decision_influence(&self) -> f32 {
        self.traits
            .iter()
            .filter_map(|t| t.modifiers.get(DECISION_INFLUENCE))
            .sum()
    }
}

/// Personality scalars in [0, 1]; 0.5 is temperamentally neutral
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Personality {
    pub confidence: f32,
}

impl Default for Personality {
    fn default() -> Self {
        Self { confidence: 0.5 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillKind {
    Foraging,
    Social,
    Athletics,
    Vigilance,
}

/// Skill levels on a 0-100 scale; 50 is baseline competence
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillTable {
    levels: AHashMap<SkillKind, f32>,
}

impl SkillTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, kind: SkillKind, level: f32) {
        self.levels.insert(kind, level.clamp(0.0, 100.0));
    }

    /// Level for a skill; untrained skills read as baseline 50
    pub fn level(&self, kind: SkillKind) -> f32 {
        self.levels.get(&kind).copied().unwrap_or(50.0)
    }
}

/// Which skill shapes which action, and in which direction
///
/// Positive sign: skill makes the action more attractive. Negative sign:
/// skill suppresses it (a vigilant agent resists sleep). Actions absent
/// from this table take no skill term.
const SKILL_TERMS: &[(&str, SkillKind, f32)] = &[
    ("eat", SkillKind::Foraging, 1.0),
    ("drink", SkillKind::Foraging, 1.0),
    ("need_fulfillment", SkillKind::Foraging, 1.0),
    ("interact", SkillKind::Social, 1.0),
    ("flee", SkillKind::Athletics, 1.0),
    ("patrol", SkillKind::Vigilance, 1.0),
    ("sleep", SkillKind::Vigilance, -1.0),
];

fn skill_term(skills: &SkillTable, action_name: &str) -> f32 {
    SKILL_TERMS
        .iter()
        .find(|(name, _, _)| *name == action_name)
        .map(|(_, kind, sign)| sign * (skills.level(*kind) - 50.0) / 100.0)
        .unwrap_or(0.0)
}

fn relationship_bonus(
    relationships: Option<&RelationshipTable>,
    target: Option<EntityId>,
    config: &BehaviorConfig,
) -> f32 {
    let Some(table) = relationships else {
        return 0.0;
    };

    match target {
        Some(other) => match table.category_of(other) {
            RelationshipCategory::CloseFriend => config.close_friend_bonus,
            RelationshipCategory::Friend => config.friend_bonus,
            _ => 0.0,
        },
        None => table.friendly_count() as f32 * config.ambient_friend_bonus,
    }
}

/// Total decision bias for one candidate action
///
/// `= sum(trait decision influences) + (confidence - 0.5)
///  + skill term + relationship bonus`
pub fn total_influence(
    traits: &TraitSet,
    personality: &Personality,
    skills: &SkillTable,
    relationships: Option<&RelationshipTable>,
    action_name: &str,
    target: Option<EntityId>,
    config: &BehaviorConfig,
) -> f32 {
    traits.decision_influence()
        + (personality.confidence - 0.5)
        + skill_term(skills, action_name)
        + relationship_bonus(relationships, target, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neutral() -> (TraitSet, Personality, SkillTable) {
        (TraitSet::default(), Personality::default(), SkillTable::new())
    }

    #[test]
    fn test_neutral_sources_yield_zero() {
        let (traits, personality, skills) = neutral();
        let config = BehaviorConfig::default();
        let bias = total_influence(&traits, &personality, &skills, None, "idle", None, &config);
        assert_eq!(bias, 0.0);
    }

    #[test]
    fn test_trait_modifiers_sum() {
        let traits = TraitSet::new(vec![
            CharacterTrait::new("Bold").with_modifier(DECISION_INFLUENCE, 0.1),
            CharacterTrait::new("Rash").with_modifier(DECISION_INFLUENCE, 0.05),
            CharacterTrait::new("Tidy").with_modifier("CraftQuality", 0.5),
        ]);
        assert!((traits.decision_influence() - 0.15).abs() < 1e-6);
    }

    #[test]
    fn test_confidence_centered_on_half() {
        let (traits, _, skills) = neutral();
        let config = BehaviorConfig::default();
        let timid = Personality { confidence: 0.2 };
        let bias = total_influence(&traits, &timid, &skills, None, "idle", None, &config);
        assert!((bias - (-0.3)).abs() < 1e-6);
    }

    #[test]
    fn test_skill_term_sign_and_scale() {
        let (traits, personality, mut skills) = neutral();
        let config = BehaviorConfig::default();
        skills.set(SkillKind::Social, 80.0);
        skills.set(SkillKind::Vigilance, 80.0);

        let interact = total_influence(&traits, &personality, &skills, None, "interact", None, &config);
        assert!((interact - 0.3).abs() < 1e-6);

        // Inverse sign: high vigilance suppresses sleep
        let sleep = total_influence(&traits, &personality, &skills, None, "sleep", None, &config);
        assert!((sleep - (-0.3)).abs() < 1e-6);

        // Unmapped action takes no skill term
        let idle = total_influence(&traits, &personality, &skills, None, "idle", None, &config);
        assert_eq!(idle, 0.0);
    }

    #[test]
    fn test_relationship_bonus_for_target() {
        let (traits, personality, skills) = neutral();
        let config = BehaviorConfig::default();
        let friend = EntityId::new();
        let mut table = RelationshipTable::new();
        table.update(friend, 0.5, 0.4, 0.4);
        assert_eq!(table.category_of(friend), RelationshipCategory::Friend);

        let bias = total_influence(
            &traits, &personality, &skills, Some(&table), "interact", Some(friend), &config,
        );
        assert!((bias - config.friend_bonus).abs() < 1e-6);
    }

    #[test]
    fn test_ambient_bonus_without_target() {
        let (traits, personality, skills) = neutral();
        let config = BehaviorConfig::default();
        let mut table = RelationshipTable::new();
        for _ in 0..3 {
            table.update(EntityId::new(), 0.5, 0.4, 0.4);
        }

        let bias = total_influence(
            &traits, &personality, &skills, Some(&table), "idle", None, &config,
        );
        assert!((bias - 3.0 * config.ambient_friend_bonus).abs() < 1e-6);
    }

    #[test]
    fn test_missing_relationship_table_contributes_zero() {
        let (traits, personality, skills) = neutral();
        let config = BehaviorConfig::default();
        let bias = total_influence(
            &traits, &personality, &skills, None, "interact", Some(EntityId::new()), &config,
        );
        assert_eq!(bias, 0.0);
    }
}
