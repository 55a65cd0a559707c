#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use brain_bt::{BehaviorNode, NodeStatus, ResumptionStack};
use brain_core::{
    CellState, EntityFactory, EntityGraph, EntityId, Faction, GridPos, Memory, ResourceGrid,
    TickContext, WorldMut, WorldView,
};

/// Minimal world: a bounded resource grid plus per-entity position, faction and memory.
#[derive(Debug, Default)]
pub struct TestWorld {
    pub width: i32,
    pub height: i32,
    pub cells: BTreeMap<GridPos, CellState>,
    pub positions: BTreeMap<EntityId, GridPos>,
    pub factions: BTreeMap<EntityId, Faction>,
    pub memories: BTreeMap<EntityId, Memory>,
    pub spawned: Vec<(String, GridPos, Faction, EntityId)>,
    pub children: Vec<(EntityId, String, EntityId)>,
    pub refuse_spawns: bool,
    next_id: u64,
}

impl TestWorld {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            next_id: 100,
            ..Self::default()
        }
    }

    pub fn place(&mut self, entity: EntityId, pos: GridPos, faction: Faction) {
        self.positions.insert(entity, pos);
        self.factions.insert(entity, faction);
    }

    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }
}

impl WorldView for TestWorld {
    fn position(&self, entity: EntityId) -> Option<GridPos> {
        self.positions.get(&entity).copied()
    }

    fn faction(&self, entity: EntityId) -> Option<Faction> {
        self.factions.get(&entity).copied()
    }

    fn memory(&self, entity: EntityId) -> Option<&Memory> {
        self.memories.get(&entity)
    }
}

impl WorldMut for TestWorld {
    fn memory_mut(&mut self, entity: EntityId) -> Option<&mut Memory> {
        self.memories.get_mut(&entity)
    }
}

impl ResourceGrid for TestWorld {
    fn read_cell(&self, pos: GridPos) -> Option<CellState> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some(self.cells.get(&pos).copied().unwrap_or(0))
    }

    fn write_cell(&mut self, pos: GridPos, state: CellState) -> bool {
        if !self.in_bounds(pos) {
            return false;
        }
        self.cells.insert(pos, state);
        true
    }
}

impl EntityFactory for TestWorld {
    fn create_entity(&mut self, archetype: &str, pos: GridPos, faction: Faction) -> Option<EntityId> {
        if self.refuse_spawns || !self.in_bounds(pos) {
            return None;
        }
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.place(id, pos, faction);
        self.memories.insert(id, Memory::new());
        self.spawned.push((archetype.to_owned(), pos, faction, id));
        Some(id)
    }
}

impl EntityGraph for TestWorld {
    fn add_child(&mut self, parent: EntityId, key: &str, child: EntityId) {
        self.children.push((parent, key.to_owned(), child));
        if let Some(memory) = self.memories.get_mut(&child) {
            memory.set("parent", parent);
        }
    }
}

/// Leaf that replays a fixed list of statuses, repeating the last one forever.
pub struct Scripted {
    name: String,
    script: Vec<NodeStatus>,
    visits: Rc<Cell<usize>>,
    log: Rc<RefCell<Vec<String>>>,
}

impl Scripted {
    pub fn new(name: &str, script: Vec<NodeStatus>, log: &Rc<RefCell<Vec<String>>>) -> Self {
        assert!(!script.is_empty());
        Self {
            name: name.to_owned(),
            script,
            visits: Rc::new(Cell::new(0)),
            log: Rc::clone(log),
        }
    }

    pub fn always(name: &str, status: NodeStatus, log: &Rc<RefCell<Vec<String>>>) -> Self {
        Self::new(name, vec![status], log)
    }

    /// `running` Running visits followed by Success.
    pub fn running_then_success(name: &str, running: usize, log: &Rc<RefCell<Vec<String>>>) -> Self {
        let mut script = vec![NodeStatus::Running; running];
        script.push(NodeStatus::Success);
        Self::new(name, script, log)
    }

    pub fn visits(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.visits)
    }
}

impl BehaviorNode<TestWorld> for Scripted {
    fn act(
        &self,
        _ctx: &TickContext,
        _entity: EntityId,
        _world: &mut TestWorld,
        _memory: &mut Memory,
        _stack: &mut ResumptionStack,
    ) -> NodeStatus {
        let n = self.visits.get();
        self.visits.set(n + 1);
        self.log.borrow_mut().push(self.name.clone());
        self.script[n.min(self.script.len() - 1)]
    }

    fn name(&self) -> &str {
        &self.name
    }
}

pub fn boxed<N>(node: N) -> Box<dyn BehaviorNode<TestWorld>>
where
    N: BehaviorNode<TestWorld>,
{
    Box::new(node)
}

pub fn new_log() -> Rc<RefCell<Vec<String>>> {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn ctx(tick: u64) -> TickContext {
    TickContext::new(tick, 0.1)
}

pub const ACTOR: EntityId = EntityId(1);
