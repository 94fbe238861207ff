//! Bounded episodic memory
//!
//! Each agent keeps a small buffer of significant events. The buffer is
//! capped; when full, the least significant entry is evicted so memory
//! stays bounded no matter how eventful a life the agent leads.

use serde::{Deserialize, Serialize};

use crate::core::types::{EntityId, Tick};

/// One remembered event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEvent {
    /// What happened, in the vocabulary of the action that recorded it
    pub event: String,
    /// Who it involved, if anyone
    pub subject: Option<EntityId>,
    /// How much it mattered, 0..1
    pub significance: f32,
    pub tick: Tick,
}

/// Bounded per-agent memory store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryLog {
    entries: Vec<MemoryEvent>,
    capacity: usize,
}

impl MemoryLog {
    pub const DEFAULT_CAPACITY: usize = 32;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity.min(Self::DEFAULT_CAPACITY)),
            capacity,
        }
    }

    /// Record an event, evicting the least significant entry when full
    pub fn record(&mut self, event: impl Into<String>, subject: Option<EntityId>, significance: f32, tick: Tick) {
        let entry = MemoryEvent {
            event: event.into(),
            subject,
            significance,
            tick,
        };

        if self.entries.len() >= self.capacity {
            if let Some(weakest) = self
                .entries
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    a.significance
                        .partial_cmp(&b.significance)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .map(|(i, _)| i)
            {
                // Do not displace a stronger memory for a weaker event
                if self.entries[weakest].significance >= entry.significance {
                    return;
                }
                self.entries.remove(weakest);
            }
        }

        self.entries.push(entry);
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemoryEvent> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Events involving a specific entity, newest first
    pub fn about(&self, subject: EntityId) -> impl Iterator<Item = &MemoryEvent> {
        self.entries
            .iter()
            .rev()
            .filter(move |e| e.subject == Some(subject))
    }
}

impl Default for MemoryLog {
    fn default() -> Self {
        Self::new()
    }
}
