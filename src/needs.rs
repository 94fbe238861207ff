//! Physiological and social needs that drive agent behavior
//!
//! Need values are urgencies in [0, 1]: 0.0 means fully satisfied, 1.0
//! means desperate. Values rise monotonically each tick; only action
//! execution brings them back down.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeedKind {
    Hunger,
    Thirst,
    Energy,
    Social,
    Safety,
}

impl NeedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NeedKind::Hunger => "Hunger",
            NeedKind::Thirst => "Thirst",
            NeedKind::Energy => "Energy",
            NeedKind::Social => "Social",
            NeedKind::Safety => "Safety",
        }
    }
}

/// One tracked need with its natural growth rate per second
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Need {
    pub kind: NeedKind,
    pub value: f32,
    pub rise_rate: f32,
}

impl Need {
    pub fn new(kind: NeedKind, value: f32, rise_rate: f32) -> Self {
        Self { kind, value, rise_rate }
    }
}

/// Keyed collection of needs, owned by one agent
///
/// Iteration order is the definition order, which is stable for the
/// lifetime of the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeedsModel {
    needs: Vec<Need>,
}

impl NeedsModel {
    pub fn new(needs: Vec<Need>) -> Self {
        Self { needs }
    }

    /// Standard loadout with slow baseline growth
    pub fn standard() -> Self {
        Self::new(vec![
            Need::new(NeedKind::Hunger, 0.2, 0.004),
            Need::new(NeedKind::Thirst, 0.2, 0.006),
            Need::new(NeedKind::Energy, 0.1, 0.002),
            Need::new(NeedKind::Social, 0.3, 0.001),
            Need::new(NeedKind::Safety, 0.0, 0.0),
        ])
    }

    pub fn get(&self, kind: NeedKind) -> Option<&Need> {
        self.needs.iter().find(|n| n.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Need> {
        self.needs.iter()
    }

    /// The need with the highest urgency; ties resolve to definition order
    pub fn most_critical(&self) -> Option<&Need> {
        self.needs.iter().max_by(|a, b| {
            a.value
                .partial_cmp(&b.value)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// Advance all needs by their rise rates; values never decrease here
    pub fn advance(&mut self, dt: f32) {
        for need in &mut self.needs {
            need.value = (need.value + need.rise_rate * dt).min(1.0);
        }
    }

    /// Reduce a need's urgency; the only path by which values fall
    pub fn satisfy(&mut self, kind: NeedKind, amount: f32) {
        if let Some(need) = self.needs.iter_mut().find(|n| n.kind == kind) {
            need.value = (need.value - amount).max(0.0);
        }
    }

    /// Push a need's urgency up (threat reactions raise Safety)
    pub fn aggravate(&mut self, kind: NeedKind, amount: f32) {
        if let Some(need) = self.needs.iter_mut().find(|n| n.kind == kind) {
            need.value = (need.value + amount).min(1.0);
        }
    }
}
