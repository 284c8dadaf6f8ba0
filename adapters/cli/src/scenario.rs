//! Scenario files describing a battlefield and the rules it is played under.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use grid_tactics_core::{CombatConfig, UnitStats};
use grid_tactics_system_bootstrap::{Bootstrap, Layout};
use serde::Deserialize;

const BUILTIN: &str = include_str!("../scenarios/skirmish.toml");

/// Battlefield, rules and unit statistics loaded from TOML.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct Scenario {
    /// Name reported in logs.
    #[serde(default = "default_name")]
    pub(crate) name: String,
    /// World-space size of a single cell.
    #[serde(default = "default_cell_size")]
    pub(crate) cell_size: f32,
    /// Combat rules shared by both teams.
    #[serde(default)]
    pub(crate) rules: CombatConfig,
    /// Statistics of every blue unit.
    #[serde(default)]
    pub(crate) blue: UnitStats,
    /// Statistics of every red unit.
    #[serde(default)]
    pub(crate) red: UnitStats,
    /// ASCII layout of the battlefield.
    pub(crate) map: String,
}

fn default_name() -> String {
    "unnamed".to_owned()
}

fn default_cell_size() -> f32 {
    1.0
}

impl Scenario {
    /// Reads a scenario from disk.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid scenario {}", path.display()))
    }

    /// Scenario bundled with the binary.
    pub(crate) fn builtin() -> Result<Self> {
        Self::parse(BUILTIN).context("bundled scenario is invalid")
    }

    fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Parses the scenario's map.
    pub(crate) fn layout(&self) -> Result<Layout> {
        Layout::parse(&self.map).with_context(|| format!("scenario {} has a broken map", self.name))
    }

    /// Bootstrap system spawning units with the scenario's statistics.
    pub(crate) fn bootstrap(&self) -> Bootstrap {
        Bootstrap::new(self.cell_size, self.blue, self.red)
    }
}
