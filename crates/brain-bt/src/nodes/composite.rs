use brain_core::{EntityId, Memory, TickContext, WorldMut};

use crate::bt::{BehaviorNode, NodeStatus};
use crate::stack::ResumptionStack;
use crate::tree::TreeError;

/// Pop the index this composite should resume at.
///
/// An index equal to `len` is the marker a composite leaves after all of its children
/// resolved, and wraps back to 0. Anything larger means the stack was written by a different
/// tree shape; it is wrapped as well, but that recovery is not something to rely on.
fn resume_index(stack: &mut ResumptionStack, len: usize, name: &str) -> usize {
    let Some(index) = stack.pop() else {
        return 0;
    };
    if len == 0 {
        return 0;
    }
    if index > len {
        tracing::warn!(
            node = name,
            index,
            children = len,
            "resumption stack does not match tree shape"
        );
    }
    index % len
}

fn init_children<W>(name: &str, children: &mut [Box<dyn BehaviorNode<W>>]) -> Result<(), TreeError>
where
    W: WorldMut + 'static,
{
    if children.is_empty() {
        return Err(TreeError::EmptyComposite {
            node: name.to_owned(),
        });
    }
    for child in children.iter_mut() {
        child.init()?;
    }
    Ok(())
}

/// Resumable AND over children.
///
/// Children run left to right; several may resolve within one tick. A Running child stops
/// the pass and is the first child visited on the next tick.
pub struct Sequence<W>
where
    W: WorldMut + 'static,
{
    name: String,
    children: Vec<Box<dyn BehaviorNode<W>>>,
}

impl<W> Sequence<W>
where
    W: WorldMut + 'static,
{
    pub fn new(children: Vec<Box<dyn BehaviorNode<W>>>) -> Self {
        Self {
            name: "Sequence".to_owned(),
            children,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl<W> BehaviorNode<W> for Sequence<W>
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
    ) -> NodeStatus {
        let len = self.children.len();
        let mut i = resume_index(stack, len, &self.name);

        let mut status = NodeStatus::Failure;
        while i < len {
            status = self.children[i].act(ctx, entity, world, memory, stack);
            match status {
                NodeStatus::Failure => {
                    // Anything deeper on the stack belongs to a superseded traversal.
                    stack.clear();
                    i = 0;
                    break;
                }
                NodeStatus::Success => {
                    stack.clear();
                    i += 1;
                }
                NodeStatus::Running => break,
            }
        }

        stack.push(i);
        status
    }

    fn init(&mut self) -> Result<(), TreeError> {
        init_children(&self.name, &mut self.children)
    }

    fn required_keys(&self, keys: &mut Vec<String>) {
        for child in &self.children {
            child.required_keys(keys);
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn describe_traversal(&self, stack: &mut ResumptionStack) -> String {
        let i = stack.pop().unwrap_or(0);
        match self.children.get(i) {
            Some(child) => format!("{} (Sequence)\n{}", self.name, child.describe_traversal(stack)),
            None => format!("{} (Sequence) all succeeded", self.name),
        }
    }
}

/// Resumable OR over children: the first child to succeed wins.
pub struct Selector<W>
where
    W: WorldMut + 'static,
{
    name: String,
    children: Vec<Box<dyn BehaviorNode<W>>>,
}

impl<W> Selector<W>
where
    W: WorldMut + 'static,
{
    pub fn new(children: Vec<Box<dyn BehaviorNode<W>>>) -> Self {
        Self {
            name: "Selector".to_owned(),
            children,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl<W> BehaviorNode<W> for Selector<W>
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
    ) -> NodeStatus {
        let len = self.children.len();
        let mut i = resume_index(stack, len, &self.name);

        let mut status = NodeStatus::Failure;
        while i < len {
            status = self.children[i].act(ctx, entity, world, memory, stack);
            match status {
                NodeStatus::Success => {
                    stack.clear();
                    i = 0;
                    break;
                }
                NodeStatus::Failure => {
                    stack.clear();
                    i += 1;
                }
                NodeStatus::Running => break,
            }
        }

        stack.push(i);
        status
    }

    fn init(&mut self) -> Result<(), TreeError> {
        init_children(&self.name, &mut self.children)
    }

    fn required_keys(&self, keys: &mut Vec<String>) {
        for child in &self.children {
            child.required_keys(keys);
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn describe_traversal(&self, stack: &mut ResumptionStack) -> String {
        let i = stack.pop().unwrap_or(0);
        match self.children.get(i) {
            Some(child) => format!("{} (Selector)\n{}", self.name, child.describe_traversal(stack)),
            None => format!("{} (Selector) all failed", self.name),
        }
    }
}
