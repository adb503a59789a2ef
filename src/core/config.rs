use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::simulation::ledger::PlayerStats;

/// What `reset_story` does with the player's health and energy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatReset {
    /// Carry the current stats into the new attempt.
    #[default]
    Preserve,
    /// Start the new attempt from the configured starting stats.
    Restore,
}

/// Whether a depleted energy bar blocks decisions inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyGate {
    /// Only the presentation layer disables choices.
    #[default]
    Advisory,
    Enforced,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub starting_stats: PlayerStats,
    #[serde(default)]
    pub reset_stats: StatReset,
    #[serde(default)]
    pub energy_gate: EnergyGate,
    #[serde(default = "default_daily_steps_goal")]
    pub daily_steps_goal: i64,
}

fn default_daily_steps_goal() -> i64 {
    5000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            starting_stats: PlayerStats::default(),
            reset_stats: StatReset::default(),
            energy_gate: EnergyGate::default(),
            daily_steps_goal: default_daily_steps_goal(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

pub fn load_engine_config(path: impl AsRef<Path>) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
        path: path.display().to_string(),
        source,
    })
}
