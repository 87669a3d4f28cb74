// Data-driven puzzle configuration.
//
// Every tunable generation parameter lives in `GridConfig`, loaded from JSON.
// Missing fields take their defaults, so a config file only needs the keys
// it changes. `validate()` runs before any grid is built; a `Grid` never
// sees an invalid config.
//
// See also: `grid.rs` which owns a `GridConfig`, `generation.rs` which reads
// the counts, budget and variety switches.
//
// **Critical constraint: determinism.** Generation is a pure function of
// `(GridConfig, seed)`.

use crate::geometry::Perspective;
use crate::types::GridPosition;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest supported extent along any grid axis.
pub const MAX_GRID_AXIS: u32 = 256;

/// Reasons a config is rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse grid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("grid axis {axis} has zero size")]
    EmptyAxis { axis: char },
    #[error("grid axis {axis} is {size}, above the limit of {}", MAX_GRID_AXIS)]
    AxisTooLarge { axis: char, size: u32 },
    #[error("start position {position} lies outside a {x}x{y}x{z} grid")]
    StartOutOfBounds {
        position: GridPosition,
        x: u32,
        y: u32,
        z: u32,
    },
    #[error("initial_cell_count must be at least 1")]
    NoInitialCells,
    #[error("max_cell_count {max} is below initial_cell_count {initial}")]
    MaxBelowInitial { max: u32, initial: u32 },
}

/// Generation parameters for one puzzle run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Grid extent as (x, y, z); y is vertical.
    pub grid_size: (u32, u32, u32),
    /// Seed cell of the first level.
    pub start_position: GridPosition,
    pub start_perspective: Perspective,
    /// Cells in level 0, counting the seed.
    pub initial_cell_count: u32,
    /// Extra cells per level.
    pub cells_per_level: u32,
    /// Level targets never exceed this.
    pub max_cell_count: u32,
    /// Tentative placements allowed per generation call.
    pub placement_retry_budget: u32,
    /// Ignore the active perspective when collecting candidates, so new
    /// cells only connect through rotation.
    pub skip_active_perspective: bool,
    /// Ignore same-height direct neighbours when collecting candidates.
    pub skip_direct_neighbors: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            grid_size: (9, 9, 9),
            start_position: GridPosition::new(4, 0, 4),
            start_perspective: Perspective::NorthEast,
            initial_cell_count: 6,
            cells_per_level: 2,
            max_cell_count: 24,
            placement_retry_budget: 64,
            skip_active_perspective: false,
            skip_direct_neighbors: false,
        }
    }
}

impl GridConfig {
    /// Parse and validate.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GridConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let (x, y, z) = self.grid_size;
        for (axis, size) in [('x', x), ('y', y), ('z', z)] {
            if size == 0 {
                return Err(ConfigError::EmptyAxis { axis });
            }
            if size > MAX_GRID_AXIS {
                return Err(ConfigError::AxisTooLarge { axis, size });
            }
        }
        if !self.contains(self.start_position) {
            return Err(ConfigError::StartOutOfBounds {
                position: self.start_position,
                x,
                y,
                z,
            });
        }
        if self.initial_cell_count == 0 {
            return Err(ConfigError::NoInitialCells);
        }
        if self.max_cell_count < self.initial_cell_count {
            return Err(ConfigError::MaxBelowInitial {
                max: self.max_cell_count,
                initial: self.initial_cell_count,
            });
        }
        Ok(())
    }

    /// Whether `pos` lies inside `grid_size`.
    pub fn contains(&self, pos: GridPosition) -> bool {
        let (x, y, z) = self.grid_size;
        pos.x >= 0
            && pos.y >= 0
            && pos.z >= 0
            && (pos.x as u32) < x
            && (pos.y as u32) < y
            && (pos.z as u32) < z
    }

    /// Target cell count for `level`, capped at `max_cell_count`.
    pub fn level_target(&self, level: u32) -> usize {
        let grown = self
            .initial_cell_count
            .saturating_add(level.saturating_mul(self.cells_per_level));
        grown.min(self.max_cell_count) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid_and_round_trips() {
        let config = GridConfig::default();
        config.validate().unwrap();
        let json = config.to_json().unwrap();
        let restored = GridConfig::from_json(&json).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config = GridConfig::from_json(r#"{ "initial_cell_count": 3 }"#).unwrap();
        assert_eq!(config.initial_cell_count, 3);
        assert_eq!(config.grid_size, (9, 9, 9));
        assert_eq!(config.start_perspective, Perspective::NorthEast);
    }

    #[test]
    fn config_loads_from_json_string() {
        let json = r#"{
            "grid_size": [5, 4, 6],
            "start_position": { "x": 1, "y": 0, "z": 2 },
            "start_perspective": "SouthWest",
            "initial_cell_count": 4,
            "cells_per_level": 1,
            "max_cell_count": 10,
            "placement_retry_budget": 20,
            "skip_active_perspective": true,
            "skip_direct_neighbors": true
        }"#;
        let config = GridConfig::from_json(json).unwrap();
        assert_eq!(config.grid_size, (5, 4, 6));
        assert_eq!(config.start_position, GridPosition::new(1, 0, 2));
        assert_eq!(config.start_perspective, Perspective::SouthWest);
        assert!(config.skip_active_perspective);
        assert!(config.skip_direct_neighbors);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = GridConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "{err}");
    }

    #[test]
    fn validation_rejects_bad_configs() {
        let base = GridConfig::default();

        let c = GridConfig {
            grid_size: (9, 0, 9),
            ..base.clone()
        };
        assert!(matches!(c.validate(), Err(ConfigError::EmptyAxis { axis: 'y' })));

        let c = GridConfig {
            grid_size: (9, 9, MAX_GRID_AXIS + 1),
            ..base.clone()
        };
        assert!(matches!(c.validate(), Err(ConfigError::AxisTooLarge { axis: 'z', .. })));

        let c = GridConfig {
            start_position: GridPosition::new(9, 0, 0),
            ..base.clone()
        };
        assert!(matches!(c.validate(), Err(ConfigError::StartOutOfBounds { .. })));

        let c = GridConfig {
            initial_cell_count: 0,
            ..base.clone()
        };
        assert!(matches!(c.validate(), Err(ConfigError::NoInitialCells)));

        let c = GridConfig {
            max_cell_count: 2,
            ..base
        };
        assert!(matches!(
            c.validate(),
            Err(ConfigError::MaxBelowInitial { max: 2, initial: 6 })
        ));
    }

    #[test]
    fn level_target_grows_then_caps() {
        let config = GridConfig::default();
        assert_eq!(config.level_target(0), 6);
        assert_eq!(config.level_target(1), 8);
        assert_eq!(config.level_target(9), 24);
        assert_eq!(config.level_target(100), 24);
        assert_eq!(config.level_target(u32::MAX), 24);
    }

    #[test]
    fn error_messages_name_the_problem() {
        let err = ConfigError::StartOutOfBounds {
            position: GridPosition::new(9, 0, 0),
            x: 9,
            y: 9,
            z: 9,
        };
        assert_eq!(err.to_string(), "start position (9, 0, 0) lies outside a 9x9x9 grid");
    }
}
