//! The standard action catalog
//!
//! Utilities are pure reads; anything an action decides during scoring is
//! re-derived in `execute` from the same percept snapshot, which is frozen
//! for the tick, so both phases agree without caching state on the shared
//! action values.

use rand::Rng;

use crate::actions::{ActionCatalog, UtilityAction};
use crate::agent::{AgentView, ExecutionContext};
use crate::core::types::{EntityId, Vec2};
use crate::needs::NeedKind;
use crate::perception::PerceivedEntity;
use crate::world::{InteractionEffect, SourceKind};

/// How far a fleeing agent projects its escape destination
const FLEE_DISTANCE: f32 = 25.0;
/// Wander picks destinations within this radius of the agent
const WANDER_RADIUS: f32 = 8.0;
/// Explore ranges further than wander
const EXPLORE_RADIUS: f32 = 30.0;

/// Relationship deltas one completed interaction applies to both parties
const INTERACT_LOVE_HATE: f32 = 0.05;
const INTERACT_RESPECT: f32 = 0.02;
const INTERACT_COMFORT: f32 = 0.05;
const INTERACT_SIGNIFICANCE: f32 = 0.3;

/// Best percept advertising satisfaction for `kind`, scored by
/// `satisfaction / max(distance, eps)`; ties keep attention order
fn best_advertised<'a>(
    perception: &'a crate::perception::PerceptionModel,
    kind: NeedKind,
    eps: f32,
) -> Option<(&'a PerceivedEntity, f32)> {
    let mut best: Option<(&PerceivedEntity, f32)> = None;
    for percept in perception.prioritized() {
        for &(advertised, satisfaction) in &percept.advertisements {
            if advertised != kind {
                continue;
            }
            let score = satisfaction / percept.distance.max(eps);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((percept, score)),
            }
        }
    }
    best
}

/// Walk toward the best satisfier or consume it in place, reducing the
/// need; the candidate choice matches what `utility` scored
fn seek_or_consume(ctx: &mut ExecutionContext, kind: NeedKind, satisfy_rate: f32) {
    let candidate = best_advertised(ctx.perception, kind, ctx.config.distance_epsilon)
        .map(|(p, _)| (p.position, p.distance));

    let Some((position, distance)) = candidate else {
        return;
    };

    if distance <= ctx.config.reach_radius {
        if let Some(needs) = ctx.needs.as_deref_mut() {
            needs.satisfy(kind, satisfy_rate * ctx.dt);
        }
        ctx.scratch.destination = None;
    } else if let Some(nav) = ctx.nav.as_deref_mut() {
        nav.move_to(position);
        ctx.scratch.destination = Some(position);
    }
}

/// Eat, Drink, and Sleep share one shape: urgency of a single named need
struct NeedAction {
    name: &'static str,
    kind: NeedKind,
    satisfy_rate: f32,
}

impl UtilityAction for NeedAction {
    fn name(&self) -> &'static str {
        self.name
    }

    fn utility(&self, view: &AgentView) -> f32 {
        match view.needs.and_then(|n| n.get(self.kind)) {
            Some(need) => 1.0 - need.value,
            None => 0.0,
        }
    }

    fn execute(&self, ctx: &mut ExecutionContext) {
        if ctx.needs.is_none() {
            return;
        }
        seek_or_consume(ctx, self.kind, self.satisfy_rate);
    }
}

/// Generalized need service: find the most critical need and chase the
/// best perceived satisfier for it
struct NeedFulfillmentAction;

impl NeedFulfillmentAction {
    fn critical_need(view: &AgentView) -> Option<(NeedKind, f32)> {
        let needs = view.needs?;
        let critical = needs.most_critical()?;
        (critical.value >= view.config.critical_need_threshold)
            .then_some((critical.kind, critical.value))
    }
}

impl UtilityAction for NeedFulfillmentAction {
    fn name(&self) -> &'static str {
        "need_fulfillment"
    }

    fn utility(&self, view: &AgentView) -> f32 {
        let Some((kind, value)) = Self::critical_need(view) else {
            return 0.0;
        };
        match best_advertised(view.perception, kind, view.config.distance_epsilon) {
            Some((_, best_score)) => (1.0 - value) * best_score,
            None => view.config.fulfillment_fallback_utility,
        }
    }

    fn execute(&self, ctx: &mut ExecutionContext) {
        let Some(critical) = ctx
            .needs
            .as_deref()
            .and_then(|n| n.most_critical())
            .filter(|n| n.value >= ctx.config.critical_need_threshold)
            .map(|n| n.kind)
        else {
            return;
        };
        seek_or_consume(ctx, critical, 0.2);
    }
}

/// Step function on the top percept: all-or-nothing escape bid
struct FleeAction;

impl UtilityAction for FleeAction {
    fn name(&self) -> &'static str {
        "flee"
    }

    fn utility(&self, view: &AgentView) -> f32 {
        match view.perception.top() {
            Some(top) if top.combined_score > view.config.flee_threshold => 1.0,
            _ => 0.0,
        }
    }

    fn execute(&self, ctx: &mut ExecutionContext) {
        let Some(threat) = ctx.perception.top() else {
            return;
        };

        let away = (ctx.body.position - threat.position).normalize();
        let escape = if away.length() > 0.0 {
            ctx.body.position + away * FLEE_DISTANCE
        } else {
            // Threat is on top of us; any direction beats none
            ctx.body.position + Vec2::new(FLEE_DISTANCE, 0.0)
        };

        if let Some(nav) = ctx.nav.as_deref_mut() {
            nav.move_to(escape);
            ctx.scratch.destination = Some(escape);
        }
        if let Some(needs) = ctx.needs.as_deref_mut() {
            needs.aggravate(NeedKind::Safety, 0.2 * ctx.dt);
        }
    }
}

/// Social contact with the most attention-grabbing perceived agent
struct InteractAction;

impl InteractAction {
    /// Percepts are attention-ordered, so the first agent percept is the
    /// best qualifying candidate
    fn candidate<'a>(view: &'a AgentView) -> Option<&'a PerceivedEntity> {
        view.perception
            .prioritized()
            .find(|p| p.kind == SourceKind::Agent)
            .filter(|p| p.combined_score > view.config.interact_threshold)
    }
}

impl UtilityAction for InteractAction {
    fn name(&self) -> &'static str {
        "interact"
    }

    fn utility(&self, view: &AgentView) -> f32 {
        if view.relationships.is_none() {
            return 0.0;
        }
        Self::candidate(view)
            .map(|p| p.combined_score)
            .unwrap_or(0.0)
    }

    fn influence_target(&self, view: &AgentView) -> Option<EntityId> {
        Self::candidate(view).map(|p| p.id)
    }

    fn execute(&self, ctx: &mut ExecutionContext) {
        if ctx.relationships.is_none() {
            return;
        }
        let candidate = ctx
            .perception
            .prioritized()
            .find(|p| p.kind == SourceKind::Agent)
            .filter(|p| p.combined_score > ctx.config.interact_threshold);
        let Some(target) = candidate else {
            ctx.scratch.interact_target = None;
            return;
        };

        ctx.scratch.interact_target = Some(target.id);

        if target.distance <= ctx.config.reach_radius {
            if let Some(memory) = ctx.memory.as_deref_mut() {
                memory.record(
                    "shared a conversation",
                    Some(target.id),
                    INTERACT_SIGNIFICANCE,
                    ctx.tick,
                );
            }
            if let Some(needs) = ctx.needs.as_deref_mut() {
                needs.satisfy(NeedKind::Social, 0.1 * ctx.dt);
            }
            // Both sides of the relationship change in the post-tick
            // merge, atomically with respect to this tick
            ctx.effects.push(InteractionEffect::Interact {
                initiator: ctx.id,
                target: target.id,
                love_hate: INTERACT_LOVE_HATE,
                respect: INTERACT_RESPECT,
                comfort: INTERACT_COMFORT,
                significance: INTERACT_SIGNIFICANCE,
            });
        } else if let Some(nav) = ctx.nav.as_deref_mut() {
            nav.move_to(target.position);
            ctx.scratch.destination = Some(target.position);
        }
    }
}

/// Do nothing, cheaply; the floor under every other bid
struct IdleAction;

impl UtilityAction for IdleAction {
    fn name(&self) -> &'static str {
        "idle"
    }

    fn utility(&self, view: &AgentView) -> f32 {
        view.config.idle_utility
    }

    fn execute(&self, _ctx: &mut ExecutionContext) {}

    fn is_ambient(&self) -> bool {
        true
    }
}

/// Short-range drifting
struct WanderAction;

impl UtilityAction for WanderAction {
    fn name(&self) -> &'static str {
        "wander"
    }

    fn utility(&self, view: &AgentView) -> f32 {
        view.config.wander_utility
    }

    fn execute(&self, ctx: &mut ExecutionContext) {
        let Some(nav) = ctx.nav.as_deref_mut() else {
            return;
        };
        if nav.has_arrived(ctx.body.position) {
            let dx = ctx.rng.gen_range(-WANDER_RADIUS..=WANDER_RADIUS);
            let dy = ctx.rng.gen_range(-WANDER_RADIUS..=WANDER_RADIUS);
            let destination = ctx.body.position + Vec2::new(dx, dy);
            nav.move_to(destination);
            ctx.scratch.destination = Some(destination);
        }
    }

    fn is_ambient(&self) -> bool {
        true
    }
}

/// Long-range roaming, biased ahead of the current facing
struct ExploreAction;

impl UtilityAction for ExploreAction {
    fn name(&self) -> &'static str {
        "explore"
    }

    fn utility(&self, view: &AgentView) -> f32 {
        view.config.explore_utility
    }

    fn execute(&self, ctx: &mut ExecutionContext) {
        let Some(nav) = ctx.nav.as_deref_mut() else {
            return;
        };
        if nav.has_arrived(ctx.body.position) {
            let ahead = ctx.body.facing * EXPLORE_RADIUS;
            let dx = ctx.rng.gen_range(-EXPLORE_RADIUS..=EXPLORE_RADIUS) * 0.5;
            let dy = ctx.rng.gen_range(-EXPLORE_RADIUS..=EXPLORE_RADIUS) * 0.5;
            let destination = ctx.body.position + ahead + Vec2::new(dx, dy);
            nav.move_to(destination);
            ctx.scratch.destination = Some(destination);
        }
    }

    fn is_ambient(&self) -> bool {
        true
    }
}

/// Cycle a per-agent waypoint route
struct PatrolAction;

impl UtilityAction for PatrolAction {
    fn name(&self) -> &'static str {
        "patrol"
    }

    fn utility(&self, view: &AgentView) -> f32 {
        if view.scratch.patrol_route.is_empty() {
            return 0.0;
        }
        view.config.patrol_utility
    }

    fn execute(&self, ctx: &mut ExecutionContext) {
        if ctx.scratch.patrol_route.is_empty() {
            return;
        }
        let Some(nav) = ctx.nav.as_deref_mut() else {
            return;
        };

        let route_len = ctx.scratch.patrol_route.len();
        let index = ctx.scratch.patrol_index % route_len;
        let waypoint = ctx.scratch.patrol_route[index];

        if ctx.body.position.distance(&waypoint) <= ctx.config.reach_radius {
            let next = (index + 1) % route_len;
            ctx.scratch.patrol_index = next;
            let destination = ctx.scratch.patrol_route[next];
            nav.move_to(destination);
            ctx.scratch.destination = Some(destination);
        } else {
            nav.move_to(waypoint);
            ctx.scratch.destination = Some(waypoint);
        }
    }

    fn is_ambient(&self) -> bool {
        true
    }
}

/// The standard catalog in its documented order; position is the
/// arbitrator's tie-break key
pub fn standard_catalog() -> ActionCatalog {
    ActionCatalog::new(vec![
        Box::new(NeedAction {
            name: "eat",
            kind: NeedKind::Hunger,
            satisfy_rate: 0.25,
        }),
        Box::new(NeedAction {
            name: "drink",
            kind: NeedKind::Thirst,
            satisfy_rate: 0.3,
        }),
        Box::new(NeedAction {
            name: "sleep",
            kind: NeedKind::Energy,
            satisfy_rate: 0.1,
        }),
        Box::new(NeedFulfillmentAction),
        Box::new(FleeAction),
        Box::new(InteractAction),
        Box::new(IdleAction),
        Box::new(WanderAction),
        Box::new(ExploreAction),
        Box::new(PatrolAction),
    ])
    .expect("standard catalog action names are unique")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::core::config::BehaviorConfig;
    use crate::fsm::{GraphSpec, StateGraph, StateSpec};
    use crate::needs::{Need, NeedsModel};
    use crate::world::{PerceptSource, WorldSnapshot};
    use std::sync::Arc;

    fn graph() -> Arc<StateGraph> {
        let catalog = ActionCatalog::standard();
        let spec = GraphSpec {
            initial: None,
            fallback: "default".into(),
            states: vec![StateSpec::new("default")],
        };
        Arc::new(StateGraph::build(spec, &catalog).unwrap())
    }

    fn agent_source(position: Vec2, loudness: f32) -> PerceptSource {
        PerceptSource {
            id: EntityId::new(),
            kind: SourceKind::Agent,
            position,
            loudness: Some(loudness),
            advertisements: Vec::new(),
        }
    }

    fn food_source(position: Vec2, satisfaction: f32) -> PerceptSource {
        PerceptSource {
            id: EntityId::new(),
            kind: SourceKind::Object,
            position,
            loudness: None,
            advertisements: vec![(NeedKind::Hunger, satisfaction)],
        }
    }

    fn refresh(agent: &mut Agent, sources: Vec<PerceptSource>, config: &BehaviorConfig) {
        let snapshot = WorldSnapshot::new(sources, Vec::new(), config.grid_cell_size);
        agent.perception.refresh(
            agent.id,
            agent.body.position,
            agent.body.facing,
            &snapshot,
            config,
        );
    }

    #[test]
    fn test_eat_utility_is_need_deficit() {
        let config = BehaviorConfig::default();
        let agent = Agent::builder("a")
            .with_needs(NeedsModel::new(vec![Need::new(NeedKind::Hunger, 0.7, 0.0)]))
            .build(graph());

        let catalog = ActionCatalog::standard();
        let eat = catalog.get(catalog.index_of("eat").unwrap());
        let utility = eat.utility(&agent.view(&config));
        assert!((utility - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_eat_without_needs_model_scores_zero() {
        let config = BehaviorConfig::default();
        let agent = Agent::builder("a").build(graph());

        let catalog = ActionCatalog::standard();
        let eat = catalog.get(catalog.index_of("eat").unwrap());
        assert_eq!(eat.utility(&agent.view(&config)), 0.0);
    }

    #[test]
    fn test_eat_without_named_need_scores_zero() {
        let config = BehaviorConfig::default();
        let agent = Agent::builder("a")
            .with_needs(NeedsModel::new(vec![Need::new(NeedKind::Thirst, 0.9, 0.0)]))
            .build(graph());

        let catalog = ActionCatalog::standard();
        let eat = catalog.get(catalog.index_of("eat").unwrap());
        assert_eq!(eat.utility(&agent.view(&config)), 0.0);
    }

    #[test]
    fn test_need_fulfillment_scenario_arithmetic() {
        // Hunger at 0.95 against a satisfaction-2.0 source at distance 2:
        // utility must be exactly (1 - 0.95) * (2.0 / 2) = 0.05.
        let config = BehaviorConfig::default();
        let mut agent = Agent::builder("a")
            .with_needs(NeedsModel::new(vec![Need::new(NeedKind::Hunger, 0.95, 0.0)]))
            .build(graph());
        refresh(&mut agent, vec![food_source(Vec2::new(2.0, 0.0), 2.0)], &config);

        let catalog = ActionCatalog::standard();
        let action = catalog.get(catalog.index_of("need_fulfillment").unwrap());
        let utility = action.utility(&agent.view(&config));
        assert!((utility - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_need_fulfillment_no_candidate_uses_fallback() {
        let config = BehaviorConfig::default();
        let agent = Agent::builder("a")
            .with_needs(NeedsModel::new(vec![Need::new(NeedKind::Hunger, 0.95, 0.0)]))
            .build(graph());

        let catalog = ActionCatalog::standard();
        let action = catalog.get(catalog.index_of("need_fulfillment").unwrap());
        let utility = action.utility(&agent.view(&config));
        assert_eq!(utility, config.fulfillment_fallback_utility);
    }

    #[test]
    fn test_need_fulfillment_below_critical_scores_zero() {
        let config = BehaviorConfig::default();
        let agent = Agent::builder("a")
            .with_needs(NeedsModel::new(vec![Need::new(NeedKind::Hunger, 0.1, 0.0)]))
            .build(graph());

        let catalog = ActionCatalog::standard();
        let action = catalog.get(catalog.index_of("need_fulfillment").unwrap());
        assert_eq!(action.utility(&agent.view(&config)), 0.0);
    }

    #[test]
    fn test_flee_is_a_step_function() {
        let config = BehaviorConfig::default();
        let mut agent = Agent::builder("a").senses(1.0, 1.0).build(graph());
        let catalog = ActionCatalog::standard();
        let flee = catalog.get(catalog.index_of("flee").unwrap());

        // Loud and close: combined score well above the threshold
        refresh(&mut agent, vec![agent_source(Vec2::new(1.0, 0.0), 5.0)], &config);
        assert_eq!(flee.utility(&agent.view(&config)), 1.0);

        // Quiet and distant: below threshold, utility drops to exactly 0
        refresh(&mut agent, vec![agent_source(Vec2::new(40.0, 0.0), 0.2)], &config);
        assert_eq!(flee.utility(&agent.view(&config)), 0.0);
    }

    #[test]
    fn test_interact_requires_relationships() {
        let config = BehaviorConfig::default();
        let mut agent = Agent::builder("a").build(graph());
        refresh(&mut agent, vec![agent_source(Vec2::new(1.0, 0.0), 3.0)], &config);

        let catalog = ActionCatalog::standard();
        let interact = catalog.get(catalog.index_of("interact").unwrap());
        assert_eq!(interact.utility(&agent.view(&config)), 0.0);
    }

    #[test]
    fn test_interact_utility_is_attention_score() {
        let config = BehaviorConfig::default();
        let mut agent = Agent::builder("a").with_relationships().build(graph());
        refresh(&mut agent, vec![agent_source(Vec2::new(1.0, 0.0), 3.0)], &config);

        let catalog = ActionCatalog::standard();
        let interact = catalog.get(catalog.index_of("interact").unwrap());
        let top_score = agent.perception.top().unwrap().combined_score;
        assert!(top_score > config.interact_threshold);
        assert_eq!(interact.utility(&agent.view(&config)), top_score);
    }

    #[test]
    fn test_interact_in_reach_queues_bidirectional_effect() {
        let config = BehaviorConfig::default();
        let mut agent = Agent::builder("a")
            .with_relationships()
            .with_memory()
            .with_needs(NeedsModel::standard())
            .build(graph());
        let partner = agent_source(Vec2::new(1.0, 0.0), 3.0);
        let partner_id = partner.id;
        refresh(&mut agent, vec![partner], &config);

        let catalog = ActionCatalog::standard();
        let interact = catalog.get(catalog.index_of("interact").unwrap());

        let mut effects = Vec::new();
        interact.execute(&mut agent.execution_ctx(&config, 5, 1.0, &mut effects));

        assert_eq!(effects.len(), 1);
        let InteractionEffect::Interact { initiator, target, .. } = &effects[0];
        assert_eq!(*initiator, agent.id);
        assert_eq!(*target, partner_id);
        assert_eq!(agent.scratch.interact_target, Some(partner_id));
        assert_eq!(agent.caps.memory.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn test_interact_out_of_reach_navigates_instead() {
        let config = BehaviorConfig::default();
        let mut agent = Agent::builder("a")
            .with_relationships()
            .with_nav(4.0)
            .build(graph());
        refresh(&mut agent, vec![agent_source(Vec2::new(10.0, 0.0), 20.0)], &config);

        let catalog = ActionCatalog::standard();
        let interact = catalog.get(catalog.index_of("interact").unwrap());

        let mut effects = Vec::new();
        interact.execute(&mut agent.execution_ctx(&config, 0, 1.0, &mut effects));

        assert!(effects.is_empty());
        assert_eq!(agent.caps.nav.as_ref().unwrap().target(), Some(Vec2::new(10.0, 0.0)));
    }

    #[test]
    fn test_ambient_actions_fill_the_candidate_set() {
        let config = BehaviorConfig::default();
        let agent = Agent::builder("a").build(graph());
        let catalog = ActionCatalog::standard();

        let view = agent.view(&config);
        let ambient_bids = catalog
            .iter()
            .filter(|a| a.is_ambient())
            .filter(|a| a.utility(&view) > 0.0)
            .count();
        // A bare agent with no collaborators still has live candidates
        assert!(ambient_bids >= 2);
    }

    #[test]
    fn test_patrol_without_route_scores_zero() {
        let config = BehaviorConfig::default();
        let agent = Agent::builder("a").build(graph());
        let catalog = ActionCatalog::standard();
        let patrol = catalog.get(catalog.index_of("patrol").unwrap());
        assert_eq!(patrol.utility(&agent.view(&config)), 0.0);
    }

    #[test]
    fn test_patrol_cycles_waypoints() {
        let config = BehaviorConfig::default();
        let route = vec![Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)];
        let mut agent = Agent::builder("a")
            .with_nav(4.0)
            .patrol_route(route)
            .build(graph());

        let catalog = ActionCatalog::standard();
        let patrol = catalog.get(catalog.index_of("patrol").unwrap());

        // Standing on waypoint 0: advance to waypoint 1
        let mut effects = Vec::new();
        patrol.execute(&mut agent.execution_ctx(&config, 0, 1.0, &mut effects));
        assert_eq!(agent.scratch.patrol_index, 1);
        assert_eq!(agent.scratch.destination, Some(Vec2::new(10.0, 0.0)));
    }

    #[test]
    fn test_executes_are_noops_without_collaborators() {
        let config = BehaviorConfig::default();
        let mut agent = Agent::builder("a").build(graph());
        let catalog = ActionCatalog::standard();

        // No needs, no nav, no relationships: every execute must degrade
        // to a no-op rather than panic
        for index in 0..catalog.len() {
            let mut effects = Vec::new();
            catalog
                .get(index)
                .execute(&mut agent.execution_ctx(&config, 0, 1.0, &mut effects));
            assert!(effects.is_empty());
        }
    }

    #[test]
    fn test_utilities_are_finite_for_bare_agent() {
        let config = BehaviorConfig::default();
        let agent = Agent::builder("a").build(graph());
        let catalog = ActionCatalog::standard();
        let view = agent.view(&config);
        for action in catalog.iter() {
            assert!(action.utility(&view).is_finite(), "{}", action.name());
        }
    }
}
