//! Entity, memory and world primitives for tick-driven behavior trees.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod entity;
pub mod memory;
pub mod tick;
pub mod world;

pub use entity::{CellState, EntityId, Faction, GridPos};
pub use memory::{Memory, Value};
pub use tick::TickContext;
pub use world::{EntityFactory, EntityGraph, ResourceGrid, WorldMut, WorldView};
