//! Small demonstration world for the behavior engine
//!
//! Spawns a handful of agents with seeded variation, a scattering of
//! need-satisfying objects, and a few occluders, then runs the scheduler
//! and prints the event stream.

use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

use mindloop::actions::ActionCatalog;
use mindloop::agent::Agent;
use mindloop::core::config::BehaviorConfig;
use mindloop::core::types::Vec2;
use mindloop::fsm::{GraphSpec, StateGraph, StateSpec};
use mindloop::influence::{CharacterTrait, Personality, SkillKind, SkillTable, TraitSet, DECISION_INFLUENCE};
use mindloop::needs::{Need, NeedKind, NeedsModel};
use mindloop::scheduler::{run_tick, SimulationEvent};
use mindloop::world::{Obstacle, World, WorldObject};

#[derive(Parser, Debug)]
#[command(name = "sim", about = "Run a demo world on the mindloop behavior engine")]
struct Args {
    /// Number of agents to spawn
    #[arg(long, default_value_t = 12)]
    agents: usize,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 400)]
    ticks: u64,

    /// Seconds of simulated time per tick
    #[arg(long, default_value_t = 0.5)]
    dt: f32,

    /// World generation seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Print every event instead of a sampled stream
    #[arg(long)]
    verbose: bool,
}

fn demo_graph(catalog: &ActionCatalog) -> StateGraph {
    let spec = GraphSpec {
        initial: Some("roam".into()),
        fallback: "roam".into(),
        states: vec![
            StateSpec::new("roam")
                .actions(&["wander", "explore"])
                .transitions(&["forage", "socialize", "evade"]),
            StateSpec::new("forage")
                .min_duration(2.0)
                .priority(1.0)
                .actions(&["eat", "drink", "need_fulfillment"])
                .transitions(&["roam", "socialize", "evade"]),
            StateSpec::new("socialize")
                .min_duration(1.5)
                .actions(&["interact"])
                .transitions(&["roam", "forage", "evade"]),
            StateSpec::new("evade")
                .min_duration(1.0)
                .priority(2.0)
                .actions(&["flee"])
                .transitions(&["roam"]),
        ],
    };
    StateGraph::build(spec, catalog).expect("demo graph is well-formed")
}

fn spawn_agent(index: usize, rng: &mut ChaCha8Rng, graph: Arc<StateGraph>) -> Agent {
    let position = Vec2::new(rng.gen_range(-60.0..60.0), rng.gen_range(-60.0..60.0));
    let facing = Vec2::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)).normalize();

    let needs = NeedsModel::new(vec![
        Need::new(NeedKind::Hunger, rng.gen_range(0.1..0.5), 0.004),
        Need::new(NeedKind::Thirst, rng.gen_range(0.1..0.5), 0.006),
        Need::new(NeedKind::Energy, rng.gen_range(0.0..0.3), 0.002),
        Need::new(NeedKind::Social, rng.gen_range(0.2..0.6), 0.001),
        Need::new(NeedKind::Safety, 0.0, 0.0),
    ]);

    let mut skills = SkillTable::new();
    skills.set(SkillKind::Foraging, rng.gen_range(20.0..80.0));
    skills.set(SkillKind::Social, rng.gen_range(20.0..80.0));
    skills.set(SkillKind::Vigilance, rng.gen_range(20.0..80.0));

    let traits = if rng.gen_bool(0.3) {
        TraitSet::new(vec![
            CharacterTrait::new("Restless").with_modifier(DECISION_INFLUENCE, 0.05)
        ])
    } else {
        TraitSet::default()
    };

    Agent::builder(format!("agent-{index:02}"))
        .position(position)
        .facing(facing)
        .senses(rng.gen_range(0.8..1.4), rng.gen_range(0.8..1.4))
        .personality(Personality {
            confidence: rng.gen_range(0.3..0.8),
        })
        .traits(traits)
        .skills(skills)
        .with_needs(needs)
        .with_memory()
        .with_relationships()
        .with_nav(rng.gen_range(3.0..5.0))
        .seed(rng.gen())
        .build(graph)
}

fn populate_objects(world: &mut World, rng: &mut ChaCha8Rng) {
    for i in 0..6 {
        let pos = Vec2::new(rng.gen_range(-70.0..70.0), rng.gen_range(-70.0..70.0));
        world.objects.push(
            WorldObject::new(format!("berry-bush-{i}"), pos).advertising(NeedKind::Hunger, 2.0),
        );
    }
    for i in 0..4 {
        let pos = Vec2::new(rng.gen_range(-70.0..70.0), rng.gen_range(-70.0..70.0));
        world.objects.push(
            WorldObject::new(format!("spring-{i}"), pos)
                .with_loudness(0.5)
                .advertising(NeedKind::Thirst, 3.0),
        );
    }
    for i in 0..3 {
        let pos = Vec2::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0));
        world.objects.push(
            WorldObject::new(format!("shelter-{i}"), pos).advertising(NeedKind::Energy, 1.5),
        );
    }
    for _ in 0..5 {
        world.obstacles.push(Obstacle {
            center: Vec2::new(rng.gen_range(-60.0..60.0), rng.gen_range(-60.0..60.0)),
            radius: rng.gen_range(1.0..4.0),
        });
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);

    let catalog = Arc::new(ActionCatalog::standard());
    let graph = Arc::new(demo_graph(&catalog));
    let mut world = World::new(BehaviorConfig::default(), catalog, graph.clone());

    for index in 0..args.agents {
        let agent = spawn_agent(index, &mut rng, graph.clone());
        world.spawn(agent);
    }
    populate_objects(&mut world, &mut rng);

    println!(
        "simulating {} agents for {} ticks (dt={}s, seed={})",
        args.agents, args.ticks, args.dt, args.seed
    );

    let mut action_switches = 0usize;
    let mut state_changes = 0usize;
    let mut interactions = 0usize;

    for _ in 0..args.ticks {
        for event in run_tick(&mut world, args.dt) {
            match &event {
                SimulationEvent::ActionStarted {
                    agent_name, action, utility, tick, ..
                } => {
                    action_switches += 1;
                    if args.verbose {
                        println!("[{tick:>5}] {agent_name} -> {action} (u={utility:.2})");
                    }
                }
                SimulationEvent::StateChanged {
                    agent_name, from, to, forced, tick, ..
                } => {
                    state_changes += 1;
                    let marker = if *forced { " (timeout)" } else { "" };
                    println!("[{tick:>5}] {agent_name}: {from} => {to}{marker}");
                }
                SimulationEvent::InteractionApplied { tick, .. } => {
                    interactions += 1;
                    if args.verbose {
                        println!("[{tick:>5}] interaction applied");
                    }
                }
            }
        }
    }

    println!("\n--- summary after {} ticks ---", args.ticks);
    println!(
        "action switches: {action_switches}, state changes: {state_changes}, interactions: {interactions}"
    );
    for agent in &world.agents {
        let action = agent
            .decision
            .current_action
            .map(|index| world.catalog.get(index).name())
            .unwrap_or("-");
        let hunger = agent
            .caps
            .needs
            .as_ref()
            .and_then(|n| n.get(NeedKind::Hunger))
            .map(|n| n.value)
            .unwrap_or(0.0);
        println!(
            "{:<10} state={:<9} action={:<16} hunger={:.2} percepts={}",
            agent.name,
            agent.state.current_state().name,
            action,
            hunger,
            agent.perception.len()
        );
    }
}
