mod support;

use brain_bt::{
    BehaviorNode, CreateEntity, Delay, ModifyResourceMap, NodeStatus, ResumptionStack, Tree,
    TreeError,
};
use brain_core::{EntityId, Faction, GridPos, Memory};

use support::{ctx, TestWorld, ACTOR};

fn act<N>(node: &N, world: &mut TestWorld, memory: &mut Memory) -> NodeStatus
where
    N: BehaviorNode<TestWorld>,
{
    let mut stack = ResumptionStack::new();
    node.act(&ctx(0), ACTOR, world, memory, &mut stack)
}

#[test]
fn delay_cycles_with_its_period() {
    let delay = Delay::new(3);
    let mut world = TestWorld::new(1, 1);
    let mut memory = Memory::new();

    let statuses: Vec<_> = (0..7).map(|_| act(&delay, &mut world, &mut memory)).collect();
    assert_eq!(
        statuses,
        vec![
            NodeStatus::Running,
            NodeStatus::Running,
            NodeStatus::Success,
            NodeStatus::Running,
            NodeStatus::Running,
            NodeStatus::Success,
            NodeStatus::Running,
        ]
    );
}

#[test]
fn delay_of_one_succeeds_every_visit() {
    let delay = Delay::new(1);
    let mut world = TestWorld::new(1, 1);
    let mut memory = Memory::new();

    for _ in 0..3 {
        assert_eq!(act(&delay, &mut world, &mut memory), NodeStatus::Success);
    }
    assert_eq!(memory.int(delay.timer_key()), Some(1));
}

#[test]
fn delays_with_the_same_period_keep_separate_counters() {
    let first = Delay::new(2);
    let second = Delay::new(2);
    assert_ne!(first.timer_key(), second.timer_key());

    let mut world = TestWorld::new(1, 1);
    let mut memory = Memory::new();

    assert_eq!(act(&first, &mut world, &mut memory), NodeStatus::Running);
    assert_eq!(act(&second, &mut world, &mut memory), NodeStatus::Running);
    assert_eq!(act(&first, &mut world, &mut memory), NodeStatus::Success);
    assert_eq!(memory.int(first.timer_key()), Some(2));
    assert_eq!(memory.int(second.timer_key()), Some(1));
    assert_eq!(act(&second, &mut world, &mut memory), NodeStatus::Success);
}

#[test]
fn delay_without_ticks_is_rejected_at_init() {
    let root: Box<dyn BehaviorNode<TestWorld>> = Box::new(Delay::new(0).named("Never"));
    assert_eq!(
        Tree::new("bad", root).err(),
        Some(TreeError::InvalidDelay {
            node: "Never".to_owned(),
            ticks: 0
        })
    );
}

#[test]
fn modify_resource_map_applies_transition_once() {
    let node = ModifyResourceMap::new(1, 2);
    let mut world = TestWorld::new(4, 4);
    let pos = GridPos::new(2, 3);
    world.place(ACTOR, pos, Faction(0));
    world.cells.insert(pos, 1);
    let mut memory = Memory::new();

    assert_eq!(act(&node, &mut world, &mut memory), NodeStatus::Success);
    assert_eq!(world.cells.get(&pos), Some(&2));

    assert_eq!(act(&node, &mut world, &mut memory), NodeStatus::Failure);
    assert_eq!(world.cells.get(&pos), Some(&2));
}

#[test]
fn modify_resource_map_fails_off_grid() {
    let node = ModifyResourceMap::new(0, 5);
    let mut world = TestWorld::new(2, 2);
    world.place(ACTOR, GridPos::new(9, 9), Faction(0));
    let mut memory = Memory::new();

    assert_eq!(act(&node, &mut world, &mut memory), NodeStatus::Failure);
    assert!(world.cells.is_empty());
}

#[test]
fn create_entity_spawns_at_memory_position_on_own_faction() {
    let node = CreateEntity::new("worker");
    let mut world = TestWorld::new(8, 8);
    world.place(ACTOR, GridPos::new(1, 1), Faction(3));
    let mut memory = Memory::new();
    memory.set("position", GridPos::new(4, 5));

    assert_eq!(act(&node, &mut world, &mut memory), NodeStatus::Success);

    let (archetype, pos, faction, child) = world.spawned[0].clone();
    assert_eq!(archetype, "worker");
    assert_eq!(pos, GridPos::new(4, 5));
    assert_eq!(faction, Faction(3));
    assert_eq!(memory.entity("child"), Some(child));
    assert_eq!(memory.entities("children"), Some(&[child][..]));
    assert_eq!(world.children, vec![(ACTOR, "children".to_owned(), child)]);
    assert_eq!(
        world.memories.get(&child).and_then(|m| m.entity("parent")),
        Some(ACTOR)
    );
}

#[test]
fn create_entity_falls_back_to_own_position() {
    let node = CreateEntity::new("scout")
        .with_children_key(None)
        .with_child_key("scout");
    let mut world = TestWorld::new(8, 8);
    world.place(ACTOR, GridPos::new(6, 2), Faction(1));
    let mut memory = Memory::new();

    assert_eq!(act(&node, &mut world, &mut memory), NodeStatus::Success);
    assert_eq!(world.spawned[0].1, GridPos::new(6, 2));
    assert!(memory.entity("scout").is_some());
    assert!(!memory.contains("children"));
    assert!(world.children.is_empty());
}

#[test]
fn create_entity_fails_when_creation_is_refused() {
    let node = CreateEntity::new("worker");
    let mut world = TestWorld::new(8, 8);
    world.place(ACTOR, GridPos::new(1, 1), Faction(0));
    world.refuse_spawns = true;
    let mut memory = Memory::new();

    assert_eq!(act(&node, &mut world, &mut memory), NodeStatus::Failure);
    assert!(!memory.contains("child"));
    assert!(!memory.contains("children"));
}

#[test]
fn create_entity_appends_to_existing_children() {
    let node = CreateEntity::new("worker").with_position_key(None);
    let mut world = TestWorld::new(8, 8);
    world.place(ACTOR, GridPos::new(1, 1), Faction(0));
    let mut memory = Memory::new();

    act(&node, &mut world, &mut memory);
    act(&node, &mut world, &mut memory);

    let ids: Vec<EntityId> = world.spawned.iter().map(|s| s.3).collect();
    assert_eq!(memory.entities("children"), Some(ids.as_slice()));
    assert_eq!(memory.entity("child"), ids.last().copied());
}
