use std::collections::BTreeMap;
use std::rc::Rc;

use brain_bt::{Agent, AgentHost, Archetype, TreeRegistry};
use brain_core::{
    CellState, EntityFactory, EntityGraph, EntityId, Faction, GridPos, Memory, ResourceGrid,
    WorldMut, WorldView,
};
use brain_tools::SharedTraceLog;

use anyhow::{bail, Result};

use crate::config::{GridConfig, MAX_CELLS};

/// Bounded resource grid populated by agents.
///
/// Owns every agent between ticks. Creation goes through the archetype table, so entities
/// spawned by trees get the same trees and vitals as configured ones.
pub struct GridWorld {
    width: i32,
    height: i32,
    max_entities: usize,
    cells: Vec<CellState>,
    positions: BTreeMap<EntityId, GridPos>,
    factions: BTreeMap<EntityId, Faction>,
    agents: BTreeMap<EntityId, Agent<GridWorld>>,
    /// Agents taken out for their own tick.
    in_flight: usize,
    kinds: BTreeMap<EntityId, String>,
    children: BTreeMap<EntityId, BTreeMap<String, Vec<EntityId>>>,
    parents: BTreeMap<EntityId, (EntityId, String)>,
    archetypes: BTreeMap<String, Archetype>,
    registry: Rc<TreeRegistry<GridWorld>>,
    trace: Option<SharedTraceLog>,
    next_id: u64,
}

impl GridWorld {
    /// Fails on an empty grid or one larger than [`MAX_CELLS`].
    ///
    /// With `trace` set every agent records into one shared log, kept for the whole run.
    pub fn new(
        grid: &GridConfig,
        archetypes: impl IntoIterator<Item = Archetype>,
        registry: TreeRegistry<GridWorld>,
        trace: bool,
    ) -> Result<Self> {
        let cells = match grid.cell_count() {
            Some(cells) if cells > 0 && cells <= MAX_CELLS => cells,
            _ => bail!(
                "Grid {}x{} must be non-empty and hold at most {MAX_CELLS} cells",
                grid.width,
                grid.height
            ),
        };
        Ok(Self {
            width: grid.width,
            height: grid.height,
            max_entities: grid.max_entities,
            cells: vec![0; cells],
            positions: BTreeMap::new(),
            factions: BTreeMap::new(),
            agents: BTreeMap::new(),
            in_flight: 0,
            kinds: BTreeMap::new(),
            children: BTreeMap::new(),
            parents: BTreeMap::new(),
            archetypes: archetypes
                .into_iter()
                .map(|a| (a.name.clone(), a))
                .collect(),
            registry: Rc::new(registry),
            trace: trace.then(SharedTraceLog::new),
            next_id: 1,
        })
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn registry(&self) -> &TreeRegistry<GridWorld> {
        &self.registry
    }

    pub fn trace(&self) -> Option<&SharedTraceLog> {
        self.trace.as_ref()
    }

    pub fn archetype_of(&self, entity: EntityId) -> Option<&str> {
        self.kinds.get(&entity).map(String::as_str)
    }

    pub fn parent_of(&self, entity: EntityId) -> Option<EntityId> {
        self.parents.get(&entity).map(|(parent, _)| *parent)
    }

    pub fn len(&self) -> usize {
        self.agents.len() + self.in_flight
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn agent(&self, entity: EntityId) -> Option<&Agent<GridWorld>> {
        self.agents.get(&entity)
    }

    pub fn agent_mut(&mut self, entity: EntityId) -> Option<&mut Agent<GridWorld>> {
        self.agents.get_mut(&entity)
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent<GridWorld>> {
        self.agents.values()
    }

    pub fn children_of(&self, parent: EntityId, key: &str) -> &[EntityId] {
        self.children
            .get(&parent)
            .and_then(|groups| groups.get(key))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    /// Number of cells currently in each state.
    pub fn cell_histogram(&self) -> BTreeMap<CellState, usize> {
        let mut histogram = BTreeMap::new();
        for &cell in &self.cells {
            *histogram.entry(cell).or_insert(0) += 1;
        }
        histogram
    }

    /// Place a new agent of `archetype`. `None` when the archetype is unknown, its trees do not
    /// resolve, `pos` is off-grid or the population cap is reached.
    pub fn spawn(&mut self, archetype: &str, pos: GridPos, faction: Faction) -> Option<EntityId> {
        if !self.in_bounds(pos) || self.len() >= self.max_entities {
            return None;
        }
        let Some(archetype) = self.archetypes.get(archetype) else {
            tracing::warn!(archetype, "unknown archetype");
            return None;
        };

        let id = EntityId(self.next_id);
        let agent = match Agent::from_archetype(id, archetype, &self.registry) {
            Ok(agent) => agent,
            Err(err) => {
                tracing::warn!(archetype = %archetype.name, %err, "archetype trees do not resolve");
                return None;
            }
        };
        let agent = match &self.trace {
            Some(trace) => agent.with_trace_sink(Box::new(trace.clone())),
            None => agent,
        };

        self.next_id += 1;
        self.kinds.insert(id, archetype.name.clone());
        self.positions.insert(id, pos);
        self.factions.insert(id, faction);
        self.agents.insert(id, agent);
        tracing::debug!(entity = %id, archetype = %archetype.name, %pos, "spawned");
        Some(id)
    }

    /// Remove a dead or discarded entity.
    ///
    /// The entity leaves its parent's child group, both in the world and in the parent's
    /// memory. Its own children keep their `parent` reference, which no longer resolves.
    pub fn despawn(&mut self, entity: EntityId) -> Option<Agent<GridWorld>> {
        let agent = self.agents.remove(&entity)?;
        self.positions.remove(&entity);
        self.factions.remove(&entity);
        self.kinds.remove(&entity);

        if let Some((parent, key)) = self.parents.remove(&entity) {
            if let Some(group) = self.children.get_mut(&parent).and_then(|g| g.get_mut(&key)) {
                group.retain(|&child| child != entity);
            }
            if let Some(memory) = self.memory_mut(parent) {
                memory.remove_entity(&key, entity);
            }
        }
        if let Some(groups) = self.children.remove(&entity) {
            for child in groups.into_values().flatten() {
                self.parents.remove(&child);
            }
        }

        tracing::debug!(%entity, "despawned");
        Some(agent)
    }

    fn cell_index(&self, pos: GridPos) -> Option<usize> {
        if !self.in_bounds(pos) {
            return None;
        }
        let x = usize::try_from(pos.x).ok()?;
        let y = usize::try_from(pos.y).ok()?;
        let width = usize::try_from(self.width).ok()?;
        y.checked_mul(width)?.checked_add(x)
    }
}

impl WorldView for GridWorld {
    fn position(&self, entity: EntityId) -> Option<GridPos> {
        self.positions.get(&entity).copied()
    }

    fn faction(&self, entity: EntityId) -> Option<Faction> {
        self.factions.get(&entity).copied()
    }

    fn memory(&self, entity: EntityId) -> Option<&Memory> {
        self.agents.get(&entity).map(|a| a.memory())
    }
}

impl WorldMut for GridWorld {
    fn memory_mut(&mut self, entity: EntityId) -> Option<&mut Memory> {
        self.agents.get_mut(&entity).map(|a| a.memory_mut())
    }
}

impl ResourceGrid for GridWorld {
    fn read_cell(&self, pos: GridPos) -> Option<CellState> {
        self.cell_index(pos).map(|i| self.cells[i])
    }

    fn write_cell(&mut self, pos: GridPos, state: CellState) -> bool {
        match self.cell_index(pos) {
            Some(i) => {
                self.cells[i] = state;
                true
            }
            None => false,
        }
    }
}

impl EntityFactory for GridWorld {
    fn create_entity(&mut self, archetype: &str, pos: GridPos, faction: Faction) -> Option<EntityId> {
        self.spawn(archetype, pos, faction)
    }
}

impl EntityGraph for GridWorld {
    fn add_child(&mut self, parent: EntityId, key: &str, child: EntityId) {
        self.children
            .entry(parent)
            .or_default()
            .entry(key.to_string())
            .or_default()
            .push(child);
        self.parents.insert(child, (parent, key.to_string()));
        if let Some(memory) = self.memory_mut(child) {
            memory.set("parent", parent);
        }
    }
}

impl AgentHost for GridWorld {
    fn agent_ids(&self) -> Vec<EntityId> {
        self.agents.keys().copied().collect()
    }

    fn take_agent(&mut self, entity: EntityId) -> Option<Agent<GridWorld>> {
        let agent = self.agents.remove(&entity)?;
        self.in_flight += 1;
        Some(agent)
    }

    fn restore_agent(&mut self, agent: Agent<GridWorld>) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.agents.insert(agent.entity(), agent);
    }
}
