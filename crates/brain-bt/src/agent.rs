use std::rc::Rc;

use brain_core::{EntityId, Memory, TickContext, WorldMut};
use brain_tools::{emit, TraceEvent, TraceSink};

use crate::bt::NodeStatus;
use crate::stack::ResumptionStack;
use crate::tree::{Tree, TreeError, TreeRegistry};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Memory key holding a reference to the entity itself.
pub const SELF_KEY: &str = "self";
pub const HEALTH_KEY: &str = "health";
pub const MAX_HEALTH_KEY: &str = "max_health";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AgentConfig {
    /// Log the traversal the next tick will take after every normal-mode tick.
    pub debug_behavior: bool,
}

/// Static description of a kind of entity: its trees and vitals.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Archetype {
    pub name: String,

    #[cfg_attr(feature = "serde", serde(default = "default_max_health"))]
    pub max_health: i64,

    /// Tree run in normal mode.
    pub behavior: String,

    /// Tree run after [`Agent::trigger_interrupt`], e.g. a battle tree.
    #[cfg_attr(feature = "serde", serde(default))]
    pub interrupt_behavior: Option<String>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub debug_behavior: bool,
}

#[cfg(feature = "serde")]
fn default_max_health() -> i64 {
    10
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentMode {
    Normal,
    Interrupting,
}

impl AgentMode {
    fn code(self) -> u64 {
        match self {
            AgentMode::Normal => 0,
            AgentMode::Interrupting => 1,
        }
    }
}

/// Per-entity tick driver.
///
/// Owns the entity's memory and resumption stack and evaluates exactly one root per tick:
/// the default tree in [`AgentMode::Normal`], the interrupt tree in
/// [`AgentMode::Interrupting`]. Every root switch clears the stack, so a tree never resumes
/// from indices written by another tree.
pub struct Agent<W>
where
    W: WorldMut + 'static,
{
    entity: EntityId,
    pub config: AgentConfig,
    memory: Memory,
    stack: ResumptionStack,
    behavior: Rc<Tree<W>>,
    interrupt: Option<Rc<Tree<W>>>,
    mode: AgentMode,
    last: Option<NodeStatus>,
    last_tick: u64,
    trace: Option<Box<dyn TraceSink>>,
}

impl<W> Agent<W>
where
    W: WorldMut + 'static,
{
    pub fn new(entity: EntityId, behavior: Rc<Tree<W>>) -> Self {
        let mut memory = Memory::new();
        memory.set(SELF_KEY, entity);
        Self {
            entity,
            config: AgentConfig::default(),
            memory,
            stack: ResumptionStack::new(),
            behavior,
            interrupt: None,
            mode: AgentMode::Normal,
            last: None,
            last_tick: 0,
            trace: None,
        }
    }

    pub fn from_archetype(
        entity: EntityId,
        archetype: &Archetype,
        registry: &TreeRegistry<W>,
    ) -> Result<Self, TreeError> {
        let behavior = registry.lookup(&archetype.behavior)?;
        let mut agent = Self::new(entity, behavior);
        agent.transform_to(archetype, registry)?;
        Ok(agent)
    }

    pub fn with_interrupt_behavior(mut self, tree: Rc<Tree<W>>) -> Self {
        self.interrupt = Some(tree);
        self
    }

    pub fn with_trace_sink(mut self, sink: Box<dyn TraceSink>) -> Self {
        self.trace = Some(sink);
        self
    }

    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn mode(&self) -> AgentMode {
        self.mode
    }

    pub fn is_interrupting(&self) -> bool {
        self.mode == AgentMode::Interrupting
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn stack(&self) -> &ResumptionStack {
        &self.stack
    }

    pub fn behavior(&self) -> &Rc<Tree<W>> {
        &self.behavior
    }

    pub fn interrupt_behavior(&self) -> Option<&Rc<Tree<W>>> {
        self.interrupt.as_ref()
    }

    pub fn last_status(&self) -> Option<NodeStatus> {
        self.last
    }

    /// The path the active tree will take on the next tick.
    pub fn describe_traversal(&self) -> String {
        match (self.mode, self.interrupt.as_ref()) {
            (AgentMode::Interrupting, Some(tree)) => tree.describe_traversal(&self.stack),
            _ => self.behavior.describe_traversal(&self.stack),
        }
    }

    /// Replace the default tree.
    ///
    /// In normal mode the stack is cleared so the new tree starts fresh. While interrupting
    /// the stack belongs to the interrupt tree and is left alone; it is cleared on the way
    /// back to normal mode anyway.
    pub fn assign_behavior(&mut self, tree: Rc<Tree<W>>) {
        tracing::debug!(entity = %self.entity, from = self.behavior.name(), to = tree.name(), "behavior assigned");
        self.behavior = tree;
        if self.mode == AgentMode::Normal {
            self.stack.clear();
        }
        emit(
            &mut self.trace,
            TraceEvent::new(self.last_tick, self.entity, "agent.behavior.assign")
                .with_a(self.mode.code()),
        );
    }

    pub fn assign_behavior_named(
        &mut self,
        registry: &TreeRegistry<W>,
        name: &str,
    ) -> Result<(), TreeError> {
        let tree = registry.lookup(name)?;
        self.assign_behavior(tree);
        Ok(())
    }

    /// Replace the interrupt tree.
    ///
    /// While interrupting, a different tree restarts from its first child and `None` drops
    /// back to normal mode.
    pub fn set_interrupt_behavior(&mut self, tree: Option<Rc<Tree<W>>>) {
        let changed = match (self.interrupt.as_ref(), tree.as_ref()) {
            (Some(old), Some(new)) => !Rc::ptr_eq(old, new),
            (None, None) => false,
            _ => true,
        };
        if changed && self.mode == AgentMode::Interrupting {
            self.stack.clear();
            if tree.is_none() {
                self.mode = AgentMode::Normal;
            }
        }
        self.interrupt = tree;
    }

    /// Keys the assigned trees read that this agent's memory does not hold yet.
    pub fn missing_keys(&self) -> Vec<String> {
        let mut missing: Vec<String> = std::iter::once(&self.behavior)
            .chain(self.interrupt.as_ref())
            .flat_map(|tree| tree.required_keys())
            .filter(|key| !self.memory.contains(key))
            .cloned()
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }

    pub fn health(&self) -> i64 {
        self.memory.int(HEALTH_KEY).unwrap_or(0)
    }

    pub fn max_health(&self) -> i64 {
        self.memory.int(MAX_HEALTH_KEY).unwrap_or(0)
    }

    /// Agents without vitals in memory never die.
    pub fn is_dead(&self) -> bool {
        self.memory.int(HEALTH_KEY).is_some_and(|health| health <= 0)
    }

    /// Lose `amount` health. Returns the new health, which may drop below zero.
    pub fn damage(&mut self, amount: i64) -> i64 {
        self.set_health(self.health().saturating_sub(amount))
    }

    /// Regain `amount` health, capped at max health.
    pub fn heal(&mut self, amount: i64) -> i64 {
        let max = self.max_health();
        self.set_health(self.health().saturating_add(amount).min(max))
    }

    pub fn kill(&mut self) {
        self.set_health(0);
    }

    fn set_health(&mut self, health: i64) -> i64 {
        self.memory.set(HEALTH_KEY, health);
        tracing::trace!(entity = %self.entity, health, "health changed");
        emit(
            &mut self.trace,
            TraceEvent::new(self.last_tick, self.entity, "agent.health")
                .with_a(health.max(0) as u64),
        );
        health
    }

    /// Re-resolve both trees from `archetype`, reset vitals in memory and restart traversal.
    ///
    /// Nothing changes when either tree name is unknown.
    pub fn transform_to(
        &mut self,
        archetype: &Archetype,
        registry: &TreeRegistry<W>,
    ) -> Result<(), TreeError> {
        let behavior = registry.lookup(&archetype.behavior)?;
        let interrupt = archetype
            .interrupt_behavior
            .as_deref()
            .map(|name| registry.lookup(name))
            .transpose()?;

        self.behavior = behavior;
        self.interrupt = interrupt;
        self.config.debug_behavior = archetype.debug_behavior;
        self.memory.set(HEALTH_KEY, archetype.max_health);
        self.memory.set(MAX_HEALTH_KEY, archetype.max_health);
        self.stack.clear();
        self.mode = AgentMode::Normal;
        Ok(())
    }

    /// Switch to the interrupt tree, discarding any in-flight traversal.
    ///
    /// Effects already committed by a Running leaf are not rolled back. Returns `false` (and
    /// does nothing) when no interrupt tree is assigned.
    pub fn trigger_interrupt(&mut self) -> bool {
        let Some(tree) = self.interrupt.as_ref() else {
            return false;
        };
        tracing::debug!(entity = %self.entity, tree = tree.name(), "interrupt triggered");
        self.mode = AgentMode::Interrupting;
        self.stack.clear();
        emit(
            &mut self.trace,
            TraceEvent::new(self.last_tick, self.entity, "agent.interrupt.enter"),
        );
        true
    }

    pub fn tick(&mut self, ctx: &TickContext, world: &mut W) -> NodeStatus {
        self.last_tick = ctx.tick;

        let status = match (self.mode, self.interrupt.as_ref()) {
            (AgentMode::Interrupting, Some(tree)) => {
                let status = tree.act(ctx, self.entity, world, &mut self.memory, &mut self.stack);
                if !status.is_running() {
                    self.mode = AgentMode::Normal;
                    self.stack.clear();
                    tracing::debug!(entity = %self.entity, %status, "interrupt finished");
                    emit(
                        &mut self.trace,
                        TraceEvent::new(ctx.tick, self.entity, "agent.interrupt.exit")
                            .with_a(status.code()),
                    );
                }
                status
            }
            _ => {
                self.mode = AgentMode::Normal;
                let status =
                    self.behavior
                        .act(ctx, self.entity, world, &mut self.memory, &mut self.stack);
                if self.config.debug_behavior {
                    tracing::debug!(
                        entity = %self.entity,
                        tick = ctx.tick,
                        %status,
                        "next tick:\n{}",
                        self.behavior.describe_traversal(&self.stack)
                    );
                }
                status
            }
        };

        emit(
            &mut self.trace,
            TraceEvent::new(ctx.tick, self.entity, "agent.tick")
                .with_a(status.code())
                .with_b(self.mode.code()),
        );
        self.last = Some(status);
        status
    }
}

/// A world that also stores the agents living in it.
///
/// Agents are taken out of the host for their own tick so that they can borrow the world
/// mutably; every other entity's memory stays reachable through [`WorldMut::memory_mut`].
pub trait AgentHost: WorldMut + Sized + 'static {
    fn agent_ids(&self) -> Vec<EntityId>;

    fn take_agent(&mut self, entity: EntityId) -> Option<Agent<Self>>;

    fn restore_agent(&mut self, agent: Agent<Self>);
}

/// Tick every agent once, in stable id order.
///
/// Entities spawned during this pass are first ticked on the next call. Returns the number of
/// agents ticked.
pub fn tick_agents<W>(ctx: &TickContext, world: &mut W) -> usize
where
    W: AgentHost,
{
    let mut ids = world.agent_ids();
    ids.sort_by_key(|id| id.stable_id());

    let mut ticked = 0;
    for id in ids {
        let Some(mut agent) = world.take_agent(id) else {
            continue;
        };
        agent.tick(ctx, world);
        world.restore_agent(agent);
        ticked += 1;
    }
    ticked
}
