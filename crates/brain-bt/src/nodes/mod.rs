//! Built-in node types.

mod composite;
mod conditional;
mod leaf;

pub use composite::{Selector, Sequence};
pub use conditional::{Compare, CompareMemoryInts, Condition, Operand};
pub use leaf::{CreateEntity, Delay, ModifyResourceMap};
