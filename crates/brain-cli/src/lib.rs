//! Grid simulation host for `brain` behavior trees.
//!
//! Library half of the `brain` binary, split out so the host can be driven from tests:
//! - [`config`] - YAML simulation config
//! - [`trees`] - built-in tree presets
//! - [`world`] - the grid world implementing every collaborator trait
//! - [`sim`] - the fixed-tick loop

pub mod config;
pub mod sim;
pub mod trees;
pub mod world;

pub use config::{GridConfig, SimConfig, SpawnConfig};
pub use sim::{RunSummary, Sim};
pub use world::GridWorld;
