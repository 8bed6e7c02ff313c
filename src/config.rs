// ⚙️ Engine Configuration - Passed explicitly into every entry point
// No module-level state: callers build this in code or load it from TOML.

use crate::chart::PillarOrder;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Which hidden stems take part in hidden-combination detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HiddenCombinationMode {
    /// Only the primary hidden stem of each branch
    #[default]
    Strict,
    /// Every hidden stem of each branch
    Loose,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub hidden_combination_mode: HiddenCombinationMode,

    /// Feed interim/annual cycle branches into relation detection
    pub include_cycle_branches: bool,

    /// Order the CLI and server assume for incoming pillars
    pub input_order: PillarOrder,

    /// Rule count at which matching switches to the rayon pool
    pub parallel_match_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            hidden_combination_mode: HiddenCombinationMode::Strict,
            include_cycle_branches: true,
            input_order: PillarOrder::TimeFirst,
            parallel_match_threshold: 256,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse engine config TOML")
    }

    /// Load config from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_toml_str(&content)
    }

    /// Builder: switch hidden-combination mode
    pub fn with_hidden_mode(mut self, mode: HiddenCombinationMode) -> Self {
        self.hidden_combination_mode = mode;
        self
    }
}
