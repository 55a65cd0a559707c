//! Simulation configuration, loaded from YAML.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use brain_bt::Archetype;
use serde::{Deserialize, Serialize};

/// Top-level simulation config. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Number of ticks `brain run` advances.
    #[serde(default = "default_ticks")]
    pub ticks: u64,

    /// Seconds per tick handed to nodes through the tick context.
    #[serde(default = "default_dt_seconds")]
    pub dt_seconds: f32,

    pub grid: GridConfig,

    /// Entity kinds the world can create, by name.
    pub archetypes: Vec<Archetype>,

    /// Entities placed before the first tick.
    pub spawns: Vec<SpawnConfig>,

    /// Health every entity of an archetype loses per tick, by archetype name.
    pub attrition: BTreeMap<String, i64>,

    /// Record a structured trace of every agent. Grows with ticks times entities.
    pub trace: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    #[serde(default = "default_grid_size")]
    pub width: i32,

    #[serde(default = "default_grid_size")]
    pub height: i32,

    /// Population cap; creation is refused beyond it.
    #[serde(default = "default_max_entities")]
    pub max_entities: usize,
}

/// Largest grid the host allocates.
pub const MAX_CELLS: usize = 1 << 24;

impl GridConfig {
    /// `None` for negative sizes or when the product overflows.
    pub fn cell_count(&self) -> Option<usize> {
        let width = usize::try_from(self.width).ok()?;
        let height = usize::try_from(self.height).ok()?;
        width.checked_mul(height)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnConfig {
    pub archetype: String,
    pub x: i32,
    pub y: i32,

    #[serde(default)]
    pub faction: u32,

    /// Tick at which the entity's interrupt tree is triggered.
    #[serde(default)]
    pub interrupt_at: Option<u64>,
}

fn default_ticks() -> u64 {
    32
}
fn default_dt_seconds() -> f32 {
    0.1
}
fn default_grid_size() -> i32 {
    12
}
fn default_max_entities() -> usize {
    64
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: default_grid_size(),
            height: default_grid_size(),
            max_entities: default_max_entities(),
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ticks: default_ticks(),
            dt_seconds: default_dt_seconds(),
            grid: GridConfig::default(),
            archetypes: vec![
                Archetype {
                    name: "farmer".to_string(),
                    max_health: 10,
                    behavior: "farm".to_string(),
                    interrupt_behavior: Some("guard".to_string()),
                    debug_behavior: false,
                },
                Archetype {
                    name: "breeder".to_string(),
                    max_health: 8,
                    behavior: "breed".to_string(),
                    interrupt_behavior: None,
                    debug_behavior: false,
                },
                Archetype {
                    name: "sprout".to_string(),
                    max_health: 3,
                    behavior: "sprout".to_string(),
                    interrupt_behavior: None,
                    debug_behavior: false,
                },
            ],
            spawns: vec![
                SpawnConfig {
                    archetype: "farmer".to_string(),
                    x: 2,
                    y: 2,
                    faction: 1,
                    interrupt_at: Some(6),
                },
                SpawnConfig {
                    archetype: "farmer".to_string(),
                    x: 5,
                    y: 5,
                    faction: 1,
                    interrupt_at: None,
                },
                SpawnConfig {
                    archetype: "breeder".to_string(),
                    x: 8,
                    y: 8,
                    faction: 2,
                    interrupt_at: None,
                },
            ],
            attrition: BTreeMap::new(),
            trace: false,
        }
    }
}

impl SimConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load from `path` when given, otherwise fall back to the built-in demo.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config = serde_yaml::from_str(content)?;
        Ok(config)
    }

    pub fn archetype(&self, name: &str) -> Option<&Archetype> {
        self.archetypes.iter().find(|a| a.name == name)
    }
}
