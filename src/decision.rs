//! Decision arbitration - choosing one action per tick without thrashing
//!
//! Raw utilities fluctuate every tick; an agent that always chased the
//! maximum would oscillate. The arbitrator holds the current action until
//! a re-evaluation trigger fires (no action yet, the decision interval
//! elapsed, the hard action ceiling elapsed) or a challenger opens a
//! utility gap wider than the override threshold.

use crate::actions::ActionCatalog;
use crate::agent::AgentView;
use crate::core::config::BehaviorConfig;
use crate::influence::total_influence;

/// Per-agent arbitration state, mutated only by the scheduler's decision
/// step
#[derive(Debug, Clone, Default)]
pub struct DecisionRecord {
    /// Catalog index of the action currently being executed
    pub current_action: Option<usize>,
    /// Seconds since the action was adopted
    pub elapsed: f32,
}

/// Why the arbitrator picked the action it did this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchReason {
    /// First tick: nothing was running yet
    Initial,
    /// The scheduled re-evaluation interval elapsed
    Scheduled,
    /// The hard per-action ceiling elapsed
    Expired,
    /// The current action is not available in the new mode
    ModeChanged,
    /// A challenger beat the current action by more than the override gap
    Preempted,
    /// The current action survived all triggers
    Kept,
}

#[derive(Debug, Clone, Copy)]
pub struct Arbitration {
    pub index: usize,
    pub reason: SwitchReason,
}

impl Arbitration {
    /// Every outcome except Kept restarts the action timer
    pub fn resets_timer(&self) -> bool {
        self.reason != SwitchReason::Kept
    }

    pub fn switched(&self) -> bool {
        self.reason != SwitchReason::Kept
    }
}

/// Adjusted utility for every catalog action:
/// `base * (1 + contextual influence)`
pub fn score_actions(catalog: &ActionCatalog, view: &AgentView) -> Vec<f32> {
    catalog
        .iter()
        .map(|action| {
            let base = action.utility(view);
            let bias = total_influence(
                view.traits,
                view.personality,
                view.skills,
                view.relationships,
                action.name(),
                action.influence_target(view),
                view.config,
            );
            base * (1.0 + bias)
        })
        .collect()
}

/// Highest-scored available action; ties resolve to the first-seen
/// catalog index (the documented tie-break rule)
pub fn best_candidate(scores: &[f32], mask: &[bool]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (index, (&score, &available)) in scores.iter().zip(mask.iter()).enumerate() {
        if !available {
            continue;
        }
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((index, score)),
        }
    }
    best
}

/// One arbitration step over pre-computed scores
///
/// Returns None only for an empty candidate set, which the ambient
/// actions rule out in any well-formed catalog.
pub fn arbitrate(
    record: &DecisionRecord,
    scores: &[f32],
    mask: &[bool],
    config: &BehaviorConfig,
) -> Option<Arbitration> {
    let (best_index, best_utility) = best_candidate(scores, mask)?;

    let Some(current) = record.current_action else {
        return Some(Arbitration {
            index: best_index,
            reason: SwitchReason::Initial,
        });
    };

    if !mask.get(current).copied().unwrap_or(false) {
        return Some(Arbitration {
            index: best_index,
            reason: SwitchReason::ModeChanged,
        });
    }

    if record.elapsed >= config.decision_duration {
        return Some(Arbitration {
            index: best_index,
            reason: SwitchReason::Scheduled,
        });
    }
    if record.elapsed >= config.max_action_duration {
        return Some(Arbitration {
            index: best_index,
            reason: SwitchReason::Expired,
        });
    }

    let current_utility = scores[current];
    if best_utility - current_utility > config.override_utility_difference {
        return Some(Arbitration {
            index: best_index,
            reason: SwitchReason::Preempted,
        });
    }

    Some(Arbitration {
        index: current,
        reason: SwitchReason::Kept,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BehaviorConfig {
        BehaviorConfig {
            decision_duration: 2.0,
            max_action_duration: 10.0,
            override_utility_difference: 0.25,
            ..Default::default()
        }
    }

    fn all_available(n: usize) -> Vec<bool> {
        vec![true; n]
    }

    #[test]
    fn test_tie_breaks_to_first_catalog_index() {
        let scores = vec![0.5, 0.5, 0.5];
        let (index, _) = best_candidate(&scores, &all_available(3)).unwrap();
        assert_eq!(index, 0);
    }

    #[test]
    fn test_masked_actions_are_skipped() {
        let scores = vec![0.9, 0.5];
        let mask = vec![false, true];
        let (index, score) = best_candidate(&scores, &mask).unwrap();
        assert_eq!(index, 1);
        assert_eq!(score, 0.5);
    }

    #[test]
    fn test_empty_mask_yields_none() {
        assert!(best_candidate(&[0.5], &[false]).is_none());
    }

    #[test]
    fn test_first_tick_adopts_best() {
        let record = DecisionRecord::default();
        let outcome = arbitrate(&record, &[0.1, 0.8], &all_available(2), &config()).unwrap();
        assert_eq!(outcome.index, 1);
        assert_eq!(outcome.reason, SwitchReason::Initial);
        assert!(outcome.resets_timer());
    }

    #[test]
    fn test_current_kept_inside_hysteresis_band() {
        let record = DecisionRecord {
            current_action: Some(0),
            elapsed: 1.0,
        };
        // Challenger leads by 0.2 < override gap 0.25
        let outcome = arbitrate(&record, &[0.5, 0.7], &all_available(2), &config()).unwrap();
        assert_eq!(outcome.index, 0);
        assert_eq!(outcome.reason, SwitchReason::Kept);
        assert!(!outcome.resets_timer());
    }

    #[test]
    fn test_preemption_requires_strict_gap() {
        let record = DecisionRecord {
            current_action: Some(0),
            elapsed: 1.0,
        };
        // Exactly the override difference is not enough
        let outcome = arbitrate(&record, &[0.5, 0.75], &all_available(2), &config()).unwrap();
        assert_eq!(outcome.reason, SwitchReason::Kept);

        let outcome = arbitrate(&record, &[0.5, 0.76], &all_available(2), &config()).unwrap();
        assert_eq!(outcome.index, 1);
        assert_eq!(outcome.reason, SwitchReason::Preempted);
    }

    #[test]
    fn test_scheduled_reevaluation_adopts_best_unconditionally() {
        let record = DecisionRecord {
            current_action: Some(0),
            elapsed: 2.0,
        };
        // Tiny gap, but the decision interval elapsed
        let outcome = arbitrate(&record, &[0.5, 0.51], &all_available(2), &config()).unwrap();
        assert_eq!(outcome.index, 1);
        assert_eq!(outcome.reason, SwitchReason::Scheduled);
    }

    #[test]
    fn test_mode_change_drops_unavailable_current() {
        let record = DecisionRecord {
            current_action: Some(0),
            elapsed: 0.5,
        };
        let mask = vec![false, true];
        let outcome = arbitrate(&record, &[0.9, 0.1], &mask, &config()).unwrap();
        assert_eq!(outcome.index, 1);
        assert_eq!(outcome.reason, SwitchReason::ModeChanged);
    }

    #[test]
    fn test_inverted_durations_dominated_by_smaller() {
        // Misconfigured decision_duration > max_action_duration: the
        // smaller ceiling still forces re-evaluation.
        let config = BehaviorConfig {
            decision_duration: 10.0,
            max_action_duration: 2.0,
            ..Default::default()
        };
        let record = DecisionRecord {
            current_action: Some(0),
            elapsed: 2.0,
        };
        let outcome = arbitrate(&record, &[0.5, 0.51], &all_available(2), &config).unwrap();
        assert_eq!(outcome.index, 1);
        assert_eq!(outcome.reason, SwitchReason::Expired);
    }
}
