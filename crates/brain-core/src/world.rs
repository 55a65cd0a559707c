use crate::{CellState, EntityId, Faction, GridPos, Memory};

/// Read-only world access.
///
/// The acting entity's own memory is owned by its driver for the duration of a tick, so
/// `memory` only needs to resolve *other* entities.
pub trait WorldView {
    fn position(&self, entity: EntityId) -> Option<GridPos>;

    fn faction(&self, entity: EntityId) -> Option<Faction>;

    fn memory(&self, entity: EntityId) -> Option<&Memory>;
}

/// Write access / effect sink.
pub trait WorldMut: WorldView {
    fn memory_mut(&mut self, entity: EntityId) -> Option<&mut Memory>;
}

/// Tile-state storage, addressed by grid position.
pub trait ResourceGrid {
    /// `None` when `pos` lies outside the grid.
    fn read_cell(&self, pos: GridPos) -> Option<CellState>;

    /// Returns `false` when `pos` lies outside the grid.
    fn write_cell(&mut self, pos: GridPos, state: CellState) -> bool;
}

/// Spawns new entities on request.
pub trait EntityFactory {
    /// `None` means creation was refused (occupied tile, unknown archetype, population cap).
    fn create_entity(&mut self, archetype: &str, pos: GridPos, faction: Faction)
        -> Option<EntityId>;
}

/// Parent/child tracking keyed by group name.
pub trait EntityGraph {
    fn add_child(&mut self, parent: EntityId, key: &str, child: EntityId);
}
