//! Fixed-tick simulation loop.

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use brain_bt::{tick_agents, AgentHost, NodeStatus};
use brain_core::{CellState, EntityId, Faction, GridPos, TickContext};
use serde::Serialize;

use crate::config::SimConfig;
use crate::trees;
use crate::world::GridWorld;

/// What a run left behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub entities: usize,
    pub cells: BTreeMap<CellState, usize>,
    pub statuses: BTreeMap<String, usize>,
    pub deaths: usize,
    pub trace_events: usize,
}

pub struct Sim {
    world: GridWorld,
    dt_seconds: f32,
    tick: u64,
    interrupts: BTreeMap<u64, Vec<EntityId>>,
    attrition: BTreeMap<String, i64>,
    deaths: usize,
}

impl Sim {
    /// Build the world described by `config` with the built-in trees.
    pub fn new(config: &SimConfig) -> Result<Self> {
        let registry = trees::registry().context("Failed to build tree presets")?;
        for archetype in &config.archetypes {
            let trees = std::iter::once(archetype.behavior.as_str())
                .chain(archetype.interrupt_behavior.as_deref());
            for tree in trees {
                registry
                    .lookup(tree)
                    .with_context(|| format!("Archetype `{}` uses an unknown tree", archetype.name))?;
            }
        }

        let mut world = GridWorld::new(
            &config.grid,
            config.archetypes.iter().cloned(),
            registry,
            config.trace,
        )
        .context("Invalid grid")?;
        let mut interrupts: BTreeMap<u64, Vec<EntityId>> = BTreeMap::new();

        for spawn in &config.spawns {
            if config.archetype(&spawn.archetype).is_none() {
                bail!("Spawn references unknown archetype `{}`", spawn.archetype);
            }
            let pos = GridPos::new(spawn.x, spawn.y);
            if !world.in_bounds(pos) {
                bail!(
                    "Spawn of `{}` at {pos} lies outside the {}x{} grid",
                    spawn.archetype,
                    world.width(),
                    world.height()
                );
            }
            let id = world
                .spawn(&spawn.archetype, pos, Faction(spawn.faction))
                .with_context(|| format!("Failed to spawn `{}` at {pos}", spawn.archetype))?;
            let missing = world
                .agent(id)
                .map(|agent| agent.missing_keys())
                .unwrap_or_default();
            if !missing.is_empty() {
                bail!(
                    "Spawn of `{}` at {pos} lacks memory keys its trees read: {}",
                    spawn.archetype,
                    missing.join(", ")
                );
            }
            if let Some(tick) = spawn.interrupt_at {
                interrupts.entry(tick).or_default().push(id);
            }
        }

        Ok(Self {
            world,
            dt_seconds: config.dt_seconds,
            tick: 0,
            interrupts,
            attrition: config.attrition.clone(),
            deaths: 0,
        })
    }

    pub fn world(&self) -> &GridWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut GridWorld {
        &mut self.world
    }

    /// Index of the next tick to run.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Advance one tick: scheduled interrupts, every agent, attrition, then the dead are removed.
    ///
    /// Returns the number of agents ticked.
    pub fn step(&mut self) -> usize {
        let ctx = TickContext::new(self.tick, self.dt_seconds);

        if let Some(ids) = self.interrupts.remove(&ctx.tick) {
            for id in ids {
                let triggered = self
                    .world
                    .agent_mut(id)
                    .is_some_and(|agent| agent.trigger_interrupt());
                if !triggered {
                    tracing::warn!(entity = %id, tick = ctx.tick, "interrupt not triggered");
                }
            }
        }

        let ticked = tick_agents(&ctx, &mut self.world);
        self.apply_attrition();
        self.reap();
        tracing::trace!(tick = ctx.tick, ticked, "tick");
        self.tick += 1;
        ticked
    }

    fn apply_attrition(&mut self) {
        if self.attrition.is_empty() {
            return;
        }
        for id in self.world.agent_ids() {
            let amount = self
                .world
                .archetype_of(id)
                .and_then(|kind| self.attrition.get(kind))
                .copied()
                .unwrap_or(0);
            if amount != 0 {
                if let Some(agent) = self.world.agent_mut(id) {
                    agent.damage(amount);
                }
            }
        }
    }

    fn reap(&mut self) {
        let dead: Vec<EntityId> = self
            .world
            .agents()
            .filter(|agent| agent.is_dead())
            .map(|agent| agent.entity())
            .collect();
        for id in dead {
            if self.world.despawn(id).is_some() {
                self.deaths += 1;
                tracing::debug!(entity = %id, tick = self.tick, "died");
            }
        }
    }

    pub fn run(&mut self, ticks: u64) -> RunSummary {
        tracing::info!(ticks, entities = self.world.len(), "Starting simulation");
        for _ in 0..ticks {
            self.step();
        }
        let summary = self.summary();
        tracing::info!(
            tick = self.tick,
            entities = summary.entities,
            trace_events = summary.trace_events,
            "Simulation finished"
        );
        summary
    }

    pub fn summary(&self) -> RunSummary {
        let mut statuses = BTreeMap::new();
        for agent in self.world.agents() {
            let key = match agent.last_status() {
                Some(NodeStatus::Running) => "running",
                Some(NodeStatus::Success) => "success",
                Some(NodeStatus::Failure) => "failure",
                None => "idle",
            };
            *statuses.entry(key.to_string()).or_insert(0) += 1;
        }

        RunSummary {
            ticks: self.tick,
            entities: self.world.len(),
            cells: self.world.cell_histogram(),
            statuses,
            deaths: self.deaths,
            trace_events: self.world.trace().map_or(0, |trace| trace.len()),
        }
    }
}
