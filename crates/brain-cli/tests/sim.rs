use std::collections::BTreeMap;

use brain_bt::{AgentMode, Archetype, NodeStatus};
use brain_cli::trees::{EMPTY, PLANTED, RIPE};
use brain_cli::{GridConfig, Sim, SimConfig, SpawnConfig};
use brain_core::{EntityId, WorldView};

fn archetype(name: &str, behavior: &str, interrupt: Option<&str>, max_health: i64) -> Archetype {
    Archetype {
        name: name.to_string(),
        max_health,
        behavior: behavior.to_string(),
        interrupt_behavior: interrupt.map(str::to_string),
        debug_behavior: false,
    }
}

fn spawn(archetype: &str, x: i32, y: i32, interrupt_at: Option<u64>) -> SpawnConfig {
    SpawnConfig {
        archetype: archetype.to_string(),
        x,
        y,
        faction: 1,
        interrupt_at,
    }
}

fn config(width: i32, height: i32, max_entities: usize) -> SimConfig {
    SimConfig {
        ticks: 10,
        dt_seconds: 0.1,
        grid: GridConfig {
            width,
            height,
            max_entities,
        },
        archetypes: Vec::new(),
        spawns: Vec::new(),
        attrition: BTreeMap::new(),
        trace: true,
    }
}

fn single_cell(sim: &Sim) -> BTreeMap<i32, usize> {
    sim.world().cell_histogram()
}

#[test]
fn farmer_cycles_its_tile() {
    let mut config = config(1, 1, 4);
    config.archetypes.push(archetype("farmer", "farm", None, 10));
    config.spawns.push(spawn("farmer", 0, 0, None));
    let mut sim = Sim::new(&config).unwrap();

    sim.run(1);
    assert_eq!(single_cell(&sim), BTreeMap::from([(PLANTED, 1)]));
    sim.run(3);
    assert_eq!(single_cell(&sim), BTreeMap::from([(RIPE, 1)]));
    sim.run(2);
    assert_eq!(single_cell(&sim), BTreeMap::from([(EMPTY, 1)]));

    let summary = sim.summary();
    assert_eq!(summary.ticks, 6);
    assert_eq!(summary.entities, 1);
    assert_eq!(summary.statuses.get("success"), Some(&1));
    assert_eq!(summary.trace_events, 6);
}

#[test]
fn breeder_spawns_sprouts_up_to_the_cap() {
    let mut config = config(3, 3, 3);
    config.archetypes.push(archetype("breeder", "breed", None, 8));
    config.archetypes.push(archetype("sprout", "sprout", None, 3));
    config.spawns.push(spawn("breeder", 1, 1, None));
    let mut sim = Sim::new(&config).unwrap();
    let breeder = EntityId(1);

    sim.run(3);
    assert_eq!(sim.world().len(), 1);

    sim.run(1);
    assert_eq!(sim.world().len(), 2);
    let sprout = EntityId(2);
    assert_eq!(sim.world().children_of(breeder, "children"), &[sprout]);
    assert_eq!(sim.world().position(sprout), sim.world().position(breeder));
    let agent = sim.world().agent(sprout).unwrap();
    assert_eq!(agent.memory().entity("parent"), Some(breeder));
    assert_eq!(agent.memory().int("health"), Some(3));
    assert_eq!(agent.last_status(), None);

    sim.run(1);
    assert_eq!(
        sim.world().agent(sprout).unwrap().last_status(),
        Some(NodeStatus::Running)
    );

    sim.run(7);
    assert_eq!(sim.world().len(), 3);
    assert_eq!(sim.world().children_of(breeder, "children").len(), 2);
    assert_eq!(
        sim.world().agent(breeder).unwrap().last_status(),
        Some(NodeStatus::Failure)
    );
}

#[test]
fn scheduled_interrupt_runs_the_guard_tree() {
    let mut config = config(2, 2, 4);
    config.archetypes.push(archetype("farmer", "farm", Some("guard"), 10));
    config.spawns.push(spawn("farmer", 0, 0, Some(1)));
    let mut sim = Sim::new(&config).unwrap();
    let farmer = EntityId(1);

    sim.run(2);
    assert_eq!(sim.world().agent(farmer).unwrap().mode(), AgentMode::Interrupting);

    sim.run(2);
    assert_eq!(sim.world().agent(farmer).unwrap().mode(), AgentMode::Normal);

    let log = sim.world().trace().unwrap().snapshot();
    assert_eq!(log.tagged("agent.interrupt.enter").count(), 1);
    let exit: Vec<_> = log.tagged("agent.interrupt.exit").collect();
    assert_eq!(exit.len(), 1);
    assert_eq!(exit[0].tick, 3);
    assert_eq!(exit[0].a, NodeStatus::Success.code());
}

#[test]
fn unknown_spawn_archetype_is_rejected() {
    let mut config = config(2, 2, 4);
    config.spawns.push(spawn("ghost", 0, 0, None));
    let err = Sim::new(&config).err().unwrap();
    assert!(err.to_string().contains("ghost"));
}

#[test]
fn off_grid_spawn_is_rejected() {
    let mut config = config(2, 2, 4);
    config.archetypes.push(archetype("farmer", "farm", None, 10));
    config.spawns.push(spawn("farmer", 5, 0, None));
    assert!(Sim::new(&config).is_err());
}

#[test]
fn archetype_with_unknown_tree_is_rejected() {
    let mut config = config(2, 2, 4);
    config.archetypes.push(archetype("farmer", "dance", None, 10));
    let err = Sim::new(&config).err().unwrap();
    assert!(format!("{err:#}").contains("dance"));
}

#[test]
fn default_demo_runs() {
    let config = SimConfig {
        trace: true,
        ..SimConfig::default()
    };
    let mut sim = Sim::new(&config).unwrap();
    let summary = sim.run(config.ticks);
    assert_eq!(summary.ticks, config.ticks);
    assert!(summary.entities > config.spawns.len());
    assert!(summary.trace_events > 0);
}

#[test]
fn trace_is_off_unless_requested() {
    let mut config = config(1, 1, 4);
    config.trace = false;
    config.archetypes.push(archetype("farmer", "farm", None, 10));
    config.spawns.push(spawn("farmer", 0, 0, None));
    let mut sim = Sim::new(&config).unwrap();

    let summary = sim.run(5);
    assert!(sim.world().trace().is_none());
    assert_eq!(summary.trace_events, 0);
}

#[test]
fn spawn_without_a_parent_for_a_parent_reading_tree_is_rejected() {
    let config = SimConfig::from_yaml("spawns:\n  - archetype: sprout\n    x: 1\n    y: 1\n").unwrap();
    let err = Sim::new(&config).err().unwrap();
    let message = format!("{err:#}");
    assert!(message.contains("sprout"), "{message}");
    assert!(message.contains("parent"), "{message}");
}

#[test]
fn oversized_or_empty_grids_are_rejected() {
    for (width, height) in [(70_000, 70_000), (-3, 4), (0, 5), (i32::MAX, 2)] {
        let config = config(width, height, 4);
        assert!(Sim::new(&config).is_err(), "{width}x{height}");
    }
}

fn breeding_config(max_entities: usize) -> SimConfig {
    let mut config = config(3, 3, max_entities);
    config.archetypes.push(archetype("breeder", "breed", None, 8));
    config.archetypes.push(archetype("sprout", "sprout", None, 3));
    config.spawns.push(spawn("breeder", 1, 1, None));
    config
}

#[test]
fn dead_parent_makes_its_sprouts_fail() {
    let mut sim = Sim::new(&breeding_config(4)).unwrap();
    let breeder = EntityId(1);
    let sprout = EntityId(2);

    sim.run(5);
    assert_eq!(sim.world().parent_of(sprout), Some(breeder));

    sim.world_mut().agent_mut(breeder).unwrap().kill();
    sim.run(1);
    assert!(sim.world().agent(breeder).is_none());
    assert_eq!(sim.world().position(breeder), None);
    assert_eq!(sim.world().parent_of(sprout), None);
    assert_eq!(sim.summary().deaths, 1);

    // The sprout's sequence wraps back to its parent check, which no longer resolves.
    sim.run(1);
    assert_eq!(
        sim.world().agent(sprout).unwrap().last_status(),
        Some(NodeStatus::Failure)
    );
}

#[test]
fn dead_child_leaves_its_parents_groups() {
    let mut sim = Sim::new(&breeding_config(4)).unwrap();
    let breeder = EntityId(1);
    let sprout = EntityId(2);

    sim.run(4);
    assert_eq!(sim.world().children_of(breeder, "children"), &[sprout]);

    sim.world_mut().agent_mut(sprout).unwrap().damage(10);
    sim.run(1);
    assert!(sim.world().agent(sprout).is_none());
    assert!(sim.world().children_of(breeder, "children").is_empty());
    let remembered = sim.world().agent(breeder).unwrap().memory().entities("children");
    assert_eq!(remembered.map_or(0, |c| c.len()), 0);
}

#[test]
fn attrition_wears_entities_down() {
    let mut config = breeding_config(4);
    config.attrition.insert("sprout".to_string(), 1);
    let mut sim = Sim::new(&config).unwrap();
    let sprout = EntityId(2);

    sim.run(5);
    assert_eq!(sim.world().agent(sprout).unwrap().health(), 1);

    sim.run(1);
    assert!(sim.world().agent(sprout).is_none());
    let summary = sim.summary();
    assert_eq!(summary.deaths, 1);
    assert_eq!(summary.entities, 1);
}
