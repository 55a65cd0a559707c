//! Built-in tree presets for the grid demo.

use brain_bt::{
    BehaviorNode, Compare, CompareMemoryInts, CreateEntity, Delay, ModifyResourceMap, Operand,
    Selector, Sequence, TreeError, TreeRegistry,
};
use brain_core::CellState;

use crate::world::GridWorld;

pub const EMPTY: CellState = 0;
pub const PLANTED: CellState = 1;
pub const RIPE: CellState = 2;

type Node = Box<dyn BehaviorNode<GridWorld>>;

fn boxed<N: BehaviorNode<GridWorld>>(node: N) -> Node {
    Box::new(node)
}

/// Work the tile underfoot through empty, planted and ripe.
///
/// Each branch starts from the state it expects, so the tree picks up wherever the tile is
/// after an interrupt.
pub fn farm() -> Node {
    boxed(
        Selector::new(vec![
            boxed(
                Sequence::new(vec![
                    boxed(ModifyResourceMap::new(EMPTY, PLANTED).named("Plant")),
                    boxed(Delay::new(3).named("Grow")),
                ])
                .named("Sow"),
            ),
            boxed(
                Sequence::new(vec![
                    boxed(ModifyResourceMap::new(PLANTED, RIPE).named("Ripen")),
                    boxed(Delay::new(2).named("Wait")),
                ])
                .named("Tend"),
            ),
            boxed(ModifyResourceMap::new(RIPE, EMPTY).named("Harvest")),
        ])
        .named("Farm"),
    )
}

/// Hold position for a while, as long as health lasts.
pub fn guard() -> Node {
    boxed(
        Sequence::new(vec![
            boxed(
                CompareMemoryInts::new(
                    Operand::new("health", 0),
                    Compare::GreaterThan,
                    Operand::new("flee_health", 2),
                )
                .named("Healthy"),
            ),
            boxed(Delay::new(3).named("Hold")),
        ])
        .named("Guard"),
    )
}

/// Spawn a sprout on the own tile every few ticks while healthy.
pub fn breed() -> Node {
    boxed(
        Sequence::new(vec![
            boxed(
                CompareMemoryInts::new(
                    Operand::new("health", 0),
                    Compare::GreaterThanOrEqual,
                    Operand::new("breed_health", 5),
                )
                .named("Fertile"),
            ),
            boxed(Delay::new(4).named("Gestate")),
            boxed(CreateEntity::new("sprout").named("Spawn")),
        ])
        .named("Breed"),
    )
}

/// Grow while the parent is still alive.
pub fn sprout() -> Node {
    boxed(
        Sequence::new(vec![
            boxed(
                CompareMemoryInts::new(
                    Operand::new("health", 0),
                    Compare::GreaterThan,
                    Operand::new("dead_health", 0),
                )
                .on_entity("parent")
                .named("ParentAlive"),
            ),
            boxed(Delay::new(2).named("Grow")),
        ])
        .named("Sprout"),
    )
}

/// Registry with every preset under its lowercase name.
pub fn registry() -> Result<TreeRegistry<GridWorld>, TreeError> {
    let mut registry = TreeRegistry::new();
    registry.insert("farm", farm())?;
    registry.insert("guard", guard())?;
    registry.insert("breed", breed())?;
    registry.insert("sprout", sprout())?;
    Ok(registry)
}
