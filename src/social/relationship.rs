//! Pairwise relationship tracking
//!
//! Three bounded axes per known entity: love/hate, respect, comfort.
//! Sentiment and category are computed from the axes, never stored.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::EntityId;

/// How an agent stands toward another, derived from overall sentiment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationshipCategory {
    Stranger,
    Acquaintance,
    Friend,
    CloseFriend,
    Rival,
    Enemy,
}

/// One directed relationship; each axis is clamped to [-1, 1]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Relationship {
    pub love_hate: f32,
    pub respect: f32,
    pub comfort: f32,
}

impl Relationship {
    /// Weighted blend of the axes; love/hate dominates
    pub fn overall_sentiment(&self) -> f32 {
        self.love_hate * 0.5 + self.respect * 0.25 + self.comfort * 0.25
    }

    pub fn category(&self) -> RelationshipCategory {
        let sentiment = self.overall_sentiment();
        match sentiment {
            s if s > 0.6 => RelationshipCategory::CloseFriend,
            s if s > 0.25 => RelationshipCategory::Friend,
            s if s > 0.05 => RelationshipCategory::Acquaintance,
            s if s < -0.5 => RelationshipCategory::Enemy,
            s if s < -0.15 => RelationshipCategory::Rival,
            _ => RelationshipCategory::Stranger,
        }
    }

    fn apply(&mut self, love_hate: f32, respect: f32, comfort: f32) {
        self.love_hate = (self.love_hate + love_hate).clamp(-1.0, 1.0);
        self.respect = (self.respect + respect).clamp(-1.0, 1.0);
        self.comfort = (self.comfort + comfort).clamp(-1.0, 1.0);
    }
}

/// All relationships one agent holds, keyed by the other party
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelationshipTable {
    entries: AHashMap<EntityId, Relationship>,
}

impl RelationshipTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, other: EntityId) -> Option<&Relationship> {
        self.entries.get(&other)
    }

    /// Apply deltas to the relationship with `other`, creating it at
    /// neutral if this is a first contact
    pub fn update(&mut self, other: EntityId, love_hate: f32, respect: f32, comfort: f32) {
        self.entries
            .entry(other)
            .or_default()
            .apply(love_hate, respect, comfort);
    }

    /// Net sentiment toward `other`; unknown entities read as 0
    pub fn overall_sentiment(&self, other: EntityId) -> f32 {
        self.entries
            .get(&other)
            .map(|r| r.overall_sentiment())
            .unwrap_or(0.0)
    }

    /// Category of `other`; unknown entities are strangers
    pub fn category_of(&self, other: EntityId) -> RelationshipCategory {
        self.entries
            .get(&other)
            .map(|r| r.category())
            .unwrap_or(RelationshipCategory::Stranger)
    }

    /// Count of relationships at Friend or CloseFriend standing
    pub fn friendly_count(&self) -> usize {
        self.entries
            .values()
            .filter(|r| {
                matches!(
                    r.category(),
                    RelationshipCategory::Friend | RelationshipCategory::CloseFriend
                )
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_entity_is_stranger() {
        let table = RelationshipTable::new();
        let other = EntityId::new();
        assert_eq!(table.category_of(other), RelationshipCategory::Stranger);
        assert_eq!(table.overall_sentiment(other), 0.0);
    }

    #[test]
    fn test_update_accumulates_and_clamps() {
        let mut table = RelationshipTable::new();
        let other = EntityId::new();
        for _ in 0..10 {
            table.update(other, 0.3, 0.3, 0.3);
        }
        let rel = table.get(other).unwrap();
        assert_eq!(rel.love_hate, 1.0);
        assert_eq!(rel.respect, 1.0);
        assert!((table.overall_sentiment(other) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_category_progression() {
        let mut table = RelationshipTable::new();
        let other = EntityId::new();

        table.update(other, 0.2, 0.2, 0.2);
        assert_eq!(table.category_of(other), RelationshipCategory::Acquaintance);

        table.update(other, 0.3, 0.2, 0.2);
        assert_eq!(table.category_of(other), RelationshipCategory::Friend);

        table.update(other, 0.5, 0.5, 0.5);
        assert_eq!(table.category_of(other), RelationshipCategory::CloseFriend);
    }

    #[test]
    fn test_negative_sentiment_categories() {
        let mut table = RelationshipTable::new();
        let other = EntityId::new();

        table.update(other, -0.4, -0.2, -0.2);
        assert_eq!(table.category_of(other), RelationshipCategory::Rival);

        table.update(other, -0.8, -0.8, -0.8);
        assert_eq!(table.category_of(other), RelationshipCategory::Enemy);
    }

    #[test]
    fn test_friendly_count() {
        let mut table = RelationshipTable::new();
        let friend = EntityId::new();
        let enemy = EntityId::new();
        table.update(friend, 0.8, 0.5, 0.5);
        table.update(enemy, -0.9, -0.9, -0.9);
        assert_eq!(table.friendly_count(), 1);
    }
}
