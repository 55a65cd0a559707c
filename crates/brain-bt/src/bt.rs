use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use brain_core::{EntityId, Memory, TickContext, WorldMut};

use crate::stack::ResumptionStack;
use crate::tree::TreeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeStatus {
    Running,
    Success,
    Failure,
}

impl NodeStatus {
    pub fn is_running(self) -> bool {
        self == NodeStatus::Running
    }

    /// Compact numeric form used in trace events.
    pub fn code(self) -> u64 {
        match self {
            NodeStatus::Running => 0,
            NodeStatus::Success => 1,
            NodeStatus::Failure => 2,
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeStatus::Running => "running",
            NodeStatus::Success => "success",
            NodeStatus::Failure => "failure",
        })
    }
}

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a node instance.
///
/// Nodes that keep per-instance state in an entity's memory derive their keys from this, so
/// two nodes with identical configuration never share an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    pub fn next() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// A unit of a behavior tree.
///
/// Nodes are shared between every entity running the same tree, so `act` takes `&self`:
/// anything that must survive a tick lives in `memory` or, for composites, in `stack`.
pub trait BehaviorNode<W>: 'static
where
    W: WorldMut + 'static,
{
    fn act(
        &self,
        ctx: &TickContext,
        entity: EntityId,
        world: &mut W,
        memory: &mut Memory,
        stack: &mut ResumptionStack,
    ) -> NodeStatus;

    /// One-time validation and setup, run by [`crate::Tree::new`] before the first tick.
    fn init(&mut self) -> Result<(), TreeError> {
        Ok(())
    }

    fn name(&self) -> &str;

    /// Collect memory keys this node reads without writing a default first.
    ///
    /// An entity whose memory lacks one of these keys cannot run the tree.
    fn required_keys(&self, _keys: &mut Vec<String>) {}

    /// Describe the path the next `act` would take, consuming `stack` the same way `act` does.
    fn describe_traversal(&self, _stack: &mut ResumptionStack) -> String {
        self.name().to_owned()
    }
}
