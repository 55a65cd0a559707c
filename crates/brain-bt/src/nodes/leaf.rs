use brain_core::{
    CellState, EntityFactory, EntityGraph, EntityId, Memory, ResourceGrid, TickContext, WorldMut,
};

use crate::bt::{BehaviorNode, NodeId, NodeStatus};
use crate::stack::ResumptionStack;
use crate::tree::TreeError;

/// Spawn an entity of `archetype` next to the actor, on the actor's faction.
pub struct CreateEntity {
    name: String,
    archetype: String,
    position_key: Option<String>,
    children_key: Option<String>,
    child_key: String,
}

impl CreateEntity {
    pub fn new(archetype: impl Into<String>) -> Self {
        Self {
            name: "CreateEntity".to_owned(),
            archetype: archetype.into(),
            position_key: Some("position".to_owned()),
            children_key: Some("children".to_owned()),
            child_key: "child".to_owned(),
        }
    }

    /// Memory key holding the spawn position. `None` always spawns at the actor's position.
    pub fn with_position_key(mut self, key: Option<&str>) -> Self {
        self.position_key = key.map(str::to_owned);
        self
    }

    /// Group under which the new entity is registered as a child. `None` skips registration.
    pub fn with_children_key(mut self, key: Option<&str>) -> Self {
        self.children_key = key.map(str::to_owned);
        self
    }

    /// Memory key receiving a reference to the new entity.
    pub fn with_child_key(mut self, key: impl Into<String>) -> Self {
        self.child_key = key.into();
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<W> BehaviorNode<W> for CreateEntity
where
    W: WorldMut + EntityFactory + EntityGraph + 'static,
{
    fn act(
        &self,
        _ctx: &TickContext,
        entity: EntityId,
        world: &mut W,
        memory: &mut Memory,
        _stack: &mut ResumptionStack,
    ) -> NodeStatus {
        let pos = self
            .position_key
            .as_deref()
            .and_then(|key| memory.position(key))
            .or_else(|| world.position(entity));
        let Some(pos) = pos else {
            tracing::warn!(node = %self.name, %entity, "no spawn position available");
            return NodeStatus::Failure;
        };
        let faction = world.faction(entity).unwrap_or_default();

        let Some(child) = world.create_entity(&self.archetype, pos, faction) else {
            tracing::debug!(node = %self.name, %entity, archetype = %self.archetype, %pos, "entity creation refused");
            return NodeStatus::Failure;
        };

        if let Some(key) = self.children_key.as_deref() {
            world.add_child(entity, key, child);
            memory.push_entity(key, child);
        }
        memory.set(self.child_key.as_str(), child);
        NodeStatus::Success
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Transition the resource cell under the actor from `from` to `to`.
pub struct ModifyResourceMap {
    name: String,
    from: CellState,
    to: CellState,
}

impl ModifyResourceMap {
    pub fn new(from: CellState, to: CellState) -> Self {
        Self {
            name: "ModifyResourceMap".to_owned(),
            from,
            to,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<W> BehaviorNode<W> for ModifyResourceMap
where
    W: WorldMut + ResourceGrid + 'static,
{
    fn act(
        &self,
        _ctx: &TickContext,
        entity: EntityId,
        world: &mut W,
        _memory: &mut Memory,
        _stack: &mut ResumptionStack,
    ) -> NodeStatus {
        let Some(pos) = world.position(entity) else {
            return NodeStatus::Failure;
        };
        if world.read_cell(pos) != Some(self.from) {
            return NodeStatus::Failure;
        }
        if !world.write_cell(pos, self.to) {
            return NodeStatus::Failure;
        }
        tracing::trace!(node = %self.name, %entity, %pos, from = self.from, to = self.to, "cell modified");
        NodeStatus::Success
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Wait `ticks` visits, then succeed once and start over.
///
/// The countdown lives in the entity's memory under a key derived from this node's
/// [`NodeId`].
pub struct Delay {
    name: String,
    ticks: i64,
    timer_key: String,
}

impl Delay {
    pub fn new(ticks: i64) -> Self {
        let id = NodeId::next();
        Self {
            name: "Delay".to_owned(),
            ticks,
            timer_key: format!("delay.timer.{}", id.get()),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn ticks(&self) -> i64 {
        self.ticks
    }

    pub fn timer_key(&self) -> &str {
        &self.timer_key
    }
}

impl<W> BehaviorNode<W> for Delay
where
    W: WorldMut + 'static,
{
    fn act(
        &self,
        _ctx: &TickContext,
        _entity: EntityId,
        _world: &mut W,
        memory: &mut Memory,
        _stack: &mut ResumptionStack,
    ) -> NodeStatus {
        memory.set_default(self.timer_key.as_str(), self.ticks);
        let timer = memory.int(&self.timer_key).unwrap_or(self.ticks) - 1;

        if timer <= 0 {
            memory.set(self.timer_key.as_str(), self.ticks);
            NodeStatus::Success
        } else {
            memory.set(self.timer_key.as_str(), timer);
            NodeStatus::Running
        }
    }

    fn init(&mut self) -> Result<(), TreeError> {
        if self.ticks < 1 {
            return Err(TreeError::InvalidDelay {
                node: self.name.clone(),
                ticks: self.ticks,
            });
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn describe_traversal(&self, _stack: &mut ResumptionStack) -> String {
        format!("{} (Delay {})", self.name, self.ticks)
    }
}
