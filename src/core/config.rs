//! Behavior engine configuration with documented constants
//!
//! All tuning values are collected here with explanations of their purpose
//! and how they interact with each other. None of them are part of the
//! algorithmic contract; they shape pacing and feel.

use serde::{Deserialize, Serialize};

use crate::core::error::{EngineError, Result};

/// Configuration for perception, arbitration, and the state machine
///
/// Loaded once and injected into the scheduler at construction; there is
/// no global config instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    // === PERCEPTION ===
    /// Size of each cell in the spatial hash grid (world units)
    ///
    /// Should be well below perception_range so radius queries touch
    /// a bounded number of cells.
    pub grid_cell_size: f32,

    /// How far agents can perceive other entities (world units)
    pub perception_range: f32,

    /// Full field-of-view angle in radians; targets outside the half-angle
    /// score zero vision
    pub field_of_view: f32,

    /// Weight of the vision score in the combined perception score
    ///
    /// Weights need not sum to 1; they are independent gains.
    pub vision_weight: f32,

    /// Weight of the audio score in the combined perception score
    pub audio_weight: f32,

    /// Lower bound on distance in score denominators, preventing blowup
    /// when a target overlaps the observer
    pub distance_epsilon: f32,

    // === DECISION ARBITRATION ===
    /// Seconds between scheduled re-evaluations of the current action
    pub decision_duration: f32,

    /// Hard ceiling on how long any action may run before a forced
    /// re-evaluation; must be >= decision_duration
    pub max_action_duration: f32,

    /// Utility gap a challenger must open up over the current action
    /// (or candidate state over the current state) to preempt it
    ///
    /// This is the hysteresis knob: higher values mean steadier agents,
    /// lower values mean twitchier ones.
    pub override_utility_difference: f32,

    // === STATE MACHINE ===
    /// Hard ceiling on state dwell time; on expiry the machine forces a
    /// transition to the fallback state, bypassing the utility gate
    pub max_state_duration: f32,

    // === NEEDS & ACTIONS ===
    /// A need at or above this value counts as critical for
    /// NeedFulfillment candidate searches
    pub critical_need_threshold: f32,

    /// Utility returned by NeedFulfillment when a need is critical but no
    /// perceived entity advertises satisfaction for it
    pub fulfillment_fallback_utility: f32,

    /// Combined perception score above which the top percept counts as a
    /// threat (Flee becomes a step to 1.0)
    pub flee_threshold: f32,

    /// Attention score the best social candidate must exceed before
    /// Interact bids at all
    pub interact_threshold: f32,

    /// Distance at which an agent can act on a target (eat from a source,
    /// talk to a neighbor) without further travel
    pub reach_radius: f32,

    /// Constant policy utilities for the ambient actions; these guarantee
    /// the arbitrator always has a candidate
    pub idle_utility: f32,
    pub wander_utility: f32,
    pub explore_utility: f32,
    pub patrol_utility: f32,

    // === CONTEXTUAL INFLUENCE ===
    /// Flat influence bonus when the evaluated target is a friend
    pub friend_bonus: f32,

    /// Flat influence bonus when the evaluated target is a close friend
    pub close_friend_bonus: f32,

    /// Per-relationship bonus summed over all friendly relationships when
    /// an action has no specific target
    pub ambient_friend_bonus: f32,

    // === PARALLELIZATION ===
    /// Minimum agent count before the perception pass uses rayon
    ///
    /// Below this, thread overhead exceeds the benefit.
    pub parallel_threshold: usize,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            // Perception
            grid_cell_size: 10.0,
            perception_range: 50.0,
            field_of_view: 2.0 * std::f32::consts::FRAC_PI_3, // 120 degrees
            vision_weight: 0.6,
            audio_weight: 0.4,
            distance_epsilon: 1e-3,

            // Arbitration
            decision_duration: 2.0,
            max_action_duration: 10.0,
            override_utility_difference: 0.25,

            // State machine
            max_state_duration: 30.0,

            // Needs & actions
            critical_need_threshold: 0.3,
            fulfillment_fallback_utility: 0.1,
            flee_threshold: 0.75,
            interact_threshold: 0.4,
            reach_radius: 2.0,
            idle_utility: 0.3,
            wander_utility: 0.25,
            explore_utility: 0.2,
            patrol_utility: 0.28,

            // Influence
            friend_bonus: 0.15,
            close_friend_bonus: 0.3,
            ambient_friend_bonus: 0.02,

            // Parallelization
            parallel_threshold: 1000,
        }
    }
}

impl BehaviorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML text; missing fields take defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.grid_cell_size <= 0.0 || self.grid_cell_size > self.perception_range {
            return Err(EngineError::InvalidConfig(format!(
                "grid_cell_size ({}) must be positive and <= perception_range ({})",
                self.grid_cell_size, self.perception_range
            )));
        }

        if self.decision_duration > self.max_action_duration {
            return Err(EngineError::InvalidConfig(format!(
                "decision_duration ({}) must be <= max_action_duration ({})",
                self.decision_duration, self.max_action_duration
            )));
        }

        if self.field_of_view <= 0.0 || self.field_of_view > std::f32::consts::TAU {
            return Err(EngineError::InvalidConfig(format!(
                "field_of_view ({}) must be in (0, 2*PI]",
                self.field_of_view
            )));
        }

        if self.vision_weight < 0.0 || self.audio_weight < 0.0 {
            return Err(EngineError::InvalidConfig(
                "perception weights must be non-negative".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.critical_need_threshold) {
            return Err(EngineError::InvalidConfig(format!(
                "critical_need_threshold ({}) must be in [0, 1]",
                self.critical_need_threshold
            )));
        }

        Ok(())
    }
}
