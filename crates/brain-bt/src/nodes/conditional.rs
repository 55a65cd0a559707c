use brain_core::{EntityId, Memory, TickContext, WorldMut};

use crate::bt::{BehaviorNode, NodeStatus};
use crate::stack::ResumptionStack;

/// Relational operator applied by [`CompareMemoryInts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Compare {
    #[default]
    Equal,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
}

impl Compare {
    pub fn holds(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Compare::Equal => lhs == rhs,
            Compare::GreaterThan => lhs > rhs,
            Compare::LessThan => lhs < rhs,
            Compare::GreaterThanOrEqual => lhs >= rhs,
            Compare::LessThanOrEqual => lhs <= rhs,
        }
    }
}

/// A memory key together with the value written when the key is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    pub key: String,
    pub default: i64,
}

impl Operand {
    pub fn new(key: impl Into<String>, default: i64) -> Self {
        Self {
            key: key.into(),
            default,
        }
    }

    fn read(&self, memory: &mut Memory) -> i64 {
        memory.set_default(self.key.as_str(), self.default);
        memory.int(&self.key).unwrap_or(self.default)
    }
}

/// Compare two integers stored in memory.
///
/// Both operands are read from the acting entity's memory, or, with [`Self::on_entity`],
/// from the memory of the entity referenced under that key. Missing operands are
/// initialised to their defaults first, which is the only side effect.
pub struct CompareMemoryInts {
    name: String,
    entity_key: Option<String>,
    lhs: Operand,
    mode: Compare,
    rhs: Operand,
}

impl CompareMemoryInts {
    pub fn new(lhs: Operand, mode: Compare, rhs: Operand) -> Self {
        Self {
            name: "CompareMemoryInts".to_owned(),
            entity_key: None,
            lhs,
            mode,
            rhs,
        }
    }

    /// Read operands from the entity referenced by `key` instead of the acting entity.
    pub fn on_entity(mut self, key: impl Into<String>) -> Self {
        self.entity_key = Some(key.into());
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn evaluate(&self, memory: &mut Memory) -> NodeStatus {
        let lhs = self.lhs.read(memory);
        let rhs = self.rhs.read(memory);
        if self.mode.holds(lhs, rhs) {
            NodeStatus::Success
        } else {
            NodeStatus::Failure
        }
    }
}

impl<W> BehaviorNode<W> for CompareMemoryInts
where
    W: WorldMut + 'static,
{
    fn act(
        &self,
        _ctx: &TickContext,
        entity: EntityId,
        world: &mut W,
        memory: &mut Memory,
        _stack: &mut ResumptionStack,
    ) -> NodeStatus {
        let Some(entity_key) = self.entity_key.as_deref() else {
            return self.evaluate(memory);
        };

        let target = memory.entity(entity_key).unwrap_or_else(|| {
            panic!(
                "{}: entity key `{entity_key}` is not set in memory of {entity}",
                self.name
            )
        });
        if target == entity {
            return self.evaluate(memory);
        }

        match world.memory_mut(target) {
            Some(other) => self.evaluate(other),
            None => {
                tracing::warn!(node = %self.name, %entity, %target, "referenced entity has no memory");
                NodeStatus::Failure
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn required_keys(&self, keys: &mut Vec<String>) {
        keys.extend(self.entity_key.iter().cloned());
    }
}

/// Closure-backed predicate.
pub struct Condition<F> {
    name: String,
    cond: F,
}

impl<F> Condition<F> {
    pub fn new(cond: F) -> Self {
        Self {
            name: "Condition".to_owned(),
            cond,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<F, W> BehaviorNode<W> for Condition<F>
where
    F: Fn(&TickContext, EntityId, &W, &Memory) -> bool + 'static,
    W: WorldMut + 'static,
{
    fn act(
        &self,
        ctx: &TickContext,
        entity: EntityId,
        world: &mut W,
        memory: &mut Memory,
        _stack: &mut ResumptionStack,
    ) -> NodeStatus {
        if (self.cond)(ctx, entity, &*world, &*memory) {
            NodeStatus::Success
        } else {
            NodeStatus::Failure
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
