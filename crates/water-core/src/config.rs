//! Configuration types for the simulation.

use crate::error::{Error, Result};
use crate::types::Edit;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Grid simulator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Number of grid rows
    pub rows: usize,
    /// Number of grid columns
    pub columns: usize,
    /// Pressure at which a cell stops accepting flow from above or below
    pub highest_allowed_pressure: u32,
    /// Minimum pressure for a cell to push water upwards
    pub pressure_to_flow_up: u32,
    /// Sources placed at random on initialization
    pub num_sources: usize,
    /// Obstacles placed at random on initialization
    pub num_obstacles: usize,
    /// Random seed for reproducibility (OS entropy when unset)
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            rows: 50,
            columns: 50,
            highest_allowed_pressure: 10,
            pressure_to_flow_up: 10,
            num_sources: 10,
            num_obstacles: 50,
            seed: None,
        }
    }
}

impl SimulatorConfig {
    /// Check dimensions and thresholds, ignoring the placement counts
    pub fn validate_thresholds(&self) -> Result<()> {
        if self.rows == 0 || self.columns == 0 {
            return Err(Error::Configuration(format!(
                "grid must have at least one cell, got {}x{}",
                self.rows, self.columns
            )));
        }
        if self.highest_allowed_pressure == 0 {
            return Err(Error::Configuration(
                "highest_allowed_pressure must be positive".to_string(),
            ));
        }
        if self.pressure_to_flow_up == 0 {
            return Err(Error::Configuration(
                "pressure_to_flow_up must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Full validation, including the random placement counts
    pub fn validate(&self) -> Result<()> {
        self.validate_thresholds()?;
        validate_placement(self.rows, self.columns, self.num_sources, self.num_obstacles)
    }
}

/// Sources and obstacles together must leave at least one empty cell
pub fn validate_placement(
    rows: usize,
    columns: usize,
    num_sources: usize,
    num_obstacles: usize,
) -> Result<()> {
    let total = rows.saturating_mul(columns);
    let requested = num_sources.saturating_add(num_obstacles);
    if requested >= total {
        return Err(Error::Configuration(format!(
            "cannot place {} sources and {} obstacles on a {}x{} grid ({} cells)",
            num_sources, num_obstacles, rows, columns, total
        )));
    }
    Ok(())
}

/// Headless runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Simulator configuration
    pub simulator: SimulatorConfig,
    /// Delay between ticks (milliseconds)
    pub tick_interval_ms: u64,
    /// Stop after this many ticks (run until shutdown when unset)
    pub max_ticks: Option<u64>,
    /// Log grid statistics every N ticks (0 disables)
    pub stats_interval_ticks: u64,
    /// Start with the tick cadence paused
    pub start_paused: bool,
    /// Emit logs as JSON
    pub log_json: bool,
    /// Print the final grid to stdout on exit
    pub print_final_grid: bool,
    /// Edits applied to the seeded grid before the first tick
    pub edits: Vec<Edit>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            simulator: SimulatorConfig::default(),
            tick_interval_ms: 50,
            max_ticks: None,
            stats_interval_ticks: 100,
            start_paused: false,
            log_json: false,
            print_final_grid: true,
            edits: Vec::new(),
        }
    }
}

impl RunnerConfig {
    /// Load configuration from a JSON file; missing fields take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config: RunnerConfig = serde_json::from_str(&contents)?;
        config.simulator.validate()?;
        info!(path = %path.display(), "Loaded runner configuration");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EditKind;

    #[test]
    fn test_default_configs() {
        let config = SimulatorConfig::default();
        assert_eq!(config.rows, 50);
        assert_eq!(config.columns, 50);
        assert_eq!(config.highest_allowed_pressure, 10);
        assert_eq!(config.pressure_to_flow_up, 10);
        assert!(config.validate().is_ok());

        let runner = RunnerConfig::default();
        assert_eq!(runner.tick_interval_ms, 50);
        assert!(runner.max_ticks.is_none());
    }

    #[test]
    fn test_placement_must_leave_room() {
        assert!(validate_placement(3, 3, 4, 4).is_ok());
        assert!(matches!(
            validate_placement(3, 3, 5, 4),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            validate_placement(2, 2, 0, 4),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let config = SimulatorConfig {
            rows: 0,
            num_sources: 0,
            num_obstacles: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_zero_thresholds_rejected() {
        let config = SimulatorConfig {
            pressure_to_flow_up: 0,
            ..Default::default()
        };
        assert!(config.validate_thresholds().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "simulator": { "rows": 8, "columns": 6, "num_sources": 1, "num_obstacles": 2, "seed": 7 },
            "max_ticks": 20,
            "edits": [{ "kind": "source", "row": 0, "column": 3 }]
        }"#;
        let config: RunnerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.simulator.rows, 8);
        assert_eq!(config.simulator.highest_allowed_pressure, 10);
        assert_eq!(config.simulator.seed, Some(7));
        assert_eq!(config.max_ticks, Some(20));
        assert_eq!(config.tick_interval_ms, 50);
        assert_eq!(config.edits, vec![Edit::new(EditKind::Source, 0, 3)]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = RunnerConfig::load("/nonexistent/water-runner.json").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
