//! Resumable behavior tree runtime built on `brain-core`.
//!
//! Trees are shared, immutable node graphs. Everything that has to survive between ticks
//! lives with the entity: its [`brain_core::Memory`] and its [`ResumptionStack`], which
//! composites use to continue a Running traversal exactly where it stopped.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod agent;
pub mod bt;
pub mod nodes;
pub mod stack;
pub mod tree;

pub use agent::{
    tick_agents, Agent, AgentConfig, AgentHost, AgentMode, Archetype, HEALTH_KEY, MAX_HEALTH_KEY,
    SELF_KEY,
};
pub use bt::{BehaviorNode, NodeId, NodeStatus};
pub use nodes::{
    Compare, CompareMemoryInts, Condition, CreateEntity, Delay, ModifyResourceMap, Operand,
    Selector, Sequence,
};
pub use stack::ResumptionStack;
pub use tree::{Tree, TreeError, TreeRegistry};
