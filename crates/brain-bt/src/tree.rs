use std::collections::BTreeMap;
use std::rc::Rc;

use brain_core::{EntityId, Memory, TickContext, WorldMut};
use thiserror::Error;

use crate::bt::{BehaviorNode, NodeStatus};
use crate::stack::ResumptionStack;

/// Malformed tree configuration, reported before any tick runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("composite `{node}` has no children")]
    EmptyComposite { node: String },

    #[error("delay `{node}` must wait at least one tick (got {ticks})")]
    InvalidDelay { node: String, ticks: i64 },

    #[error("no tree registered under `{0}`")]
    UnknownTree(String),

    #[error("a tree named `{0}` is already registered")]
    DuplicateTree(String),
}

/// A validated, named root node.
///
/// Construction runs [`BehaviorNode::init`] over the whole tree exactly once, so a `Tree`
/// that exists is safe to tick.
pub struct Tree<W>
where
    W: WorldMut + 'static,
{
    name: String,
    root: Box<dyn BehaviorNode<W>>,
    required_keys: Vec<String>,
}

impl<W> Tree<W>
where
    W: WorldMut + 'static,
{
    pub fn new(name: impl Into<String>, mut root: Box<dyn BehaviorNode<W>>) -> Result<Self, TreeError> {
        root.init()?;
        let mut required_keys = Vec::new();
        root.required_keys(&mut required_keys);
        required_keys.sort();
        required_keys.dedup();
        Ok(Self {
            name: name.into(),
            root,
            required_keys,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Memory keys an entity must hold before its first tick on this tree, sorted.
    pub fn required_keys(&self) -> &[String] {
        &self.required_keys
    }

    pub fn root(&self) -> &dyn BehaviorNode<W> {
        self.root.as_ref()
    }

    pub fn act(
        &self,
        ctx: &TickContext,
        entity: EntityId,
        world: &mut W,
        memory: &mut Memory,
        stack: &mut ResumptionStack,
    ) -> NodeStatus {
        self.root.act(ctx, entity, world, memory, stack)
    }

    /// The path the next tick will take, without touching `stack`.
    pub fn describe_traversal(&self, stack: &ResumptionStack) -> String {
        let mut copy = stack.clone();
        self.root.describe_traversal(&mut copy)
    }
}

/// Named trees shared by every entity that runs them.
pub struct TreeRegistry<W>
where
    W: WorldMut + 'static,
{
    trees: BTreeMap<String, Rc<Tree<W>>>,
}

impl<W> TreeRegistry<W>
where
    W: WorldMut + 'static,
{
    pub fn new() -> Self {
        Self {
            trees: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, tree: Tree<W>) -> Result<Rc<Tree<W>>, TreeError> {
        if self.trees.contains_key(tree.name()) {
            return Err(TreeError::DuplicateTree(tree.name().to_owned()));
        }
        let tree = Rc::new(tree);
        self.trees.insert(tree.name().to_owned(), Rc::clone(&tree));
        Ok(tree)
    }

    /// Build and register in one step.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        root: Box<dyn BehaviorNode<W>>,
    ) -> Result<Rc<Tree<W>>, TreeError> {
        self.register(Tree::new(name, root)?)
    }

    pub fn lookup(&self, name: &str) -> Result<Rc<Tree<W>>, TreeError> {
        self.trees
            .get(name)
            .cloned()
            .ok_or_else(|| TreeError::UnknownTree(name.to_owned()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.trees.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.trees.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}

impl<W> Default for TreeRegistry<W>
where
    W: WorldMut + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
