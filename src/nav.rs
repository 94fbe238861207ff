//! Navigation collaborator
//!
//! The behavior core never executes pathfinding; it issues fire-and-forget
//! `move_to` requests and polls `has_arrived` on later ticks. The kinematic
//! stub below is enough for tests and the demo binary; a real integration
//! replaces `advance` with calls into an actual navigation system.

use serde::{Deserialize, Serialize};

use crate::core::types::Vec2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Navigation {
    target: Option<Vec2>,
    /// World units per second the stub moves an agent
    pub speed: f32,
    /// Distance at which a target counts as reached
    pub arrive_radius: f32,
}

impl Navigation {
    pub fn new(speed: f32) -> Self {
        Self {
            target: None,
            speed,
            arrive_radius: 0.5,
        }
    }

    /// Request travel toward a position; replaces any previous request
    pub fn move_to(&mut self, position: Vec2) {
        self.target = Some(position);
    }

    pub fn target(&self) -> Option<Vec2> {
        self.target
    }

    /// Whether the last requested target has been reached (or none was set)
    pub fn has_arrived(&self, current: Vec2) -> bool {
        match self.target {
            Some(target) => current.distance(&target) <= self.arrive_radius,
            None => true,
        }
    }

    /// Kinematic stub: step `current` toward the target, clearing it on
    /// arrival. Called by the scheduler, never by actions.
    pub fn advance(&mut self, current: Vec2, dt: f32) -> Vec2 {
        let Some(target) = self.target else {
            return current;
        };

        let to_target = target - current;
        let dist = to_target.length();
        let step = self.speed * dt;

        if dist <= step.max(self.arrive_radius) {
            self.target = None;
            return target;
        }

        current + to_target.normalize() * step
    }
}

impl Default for Navigation {
    fn default() -> Self {
        Self::new(4.0)
    }
}
