use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RoomError};

/// Default minimum room area in square pixels
pub const DEFAULT_MIN_ROOM_AREA: f64 = 2000.0;

/// Confidence reported for the whole-canvas room when no walls exist
pub const WHOLE_CANVAS_CONFIDENCE: f64 = 1.0;

/// Polygon simplification strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SimplificationMethod {
    /// Drop vertices whose turn angle is below `collinear_tolerance_deg`
    #[default]
    Collinear,
    /// Douglas-Peucker with epsilon relative to the polygon perimeter
    DouglasPeucker {
        #[schemars(range(min = 0.0, max = 0.1))]
        epsilon_factor: f64,
    },
}

/// Tunables for one conversion call.
///
/// Every threshold lives here and is passed explicitly; nothing is read from
/// process-wide state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DetectionConfig {
    /// Rooms smaller than this (square pixels) are dropped
    pub min_room_area: f64,
    /// Cell budget for the occupancy grid; larger canvases are downsampled
    pub max_grid_cells: u64,
    /// Turn angle (degrees) below which a vertex counts as collinear
    pub collinear_tolerance_deg: f64,
    /// Allowed deviation (degrees) from 90 for a rectangle corner
    pub right_angle_tolerance_deg: f64,
    /// Maximum relative area change a simplification may introduce
    pub max_area_drift: f64,
    /// Radius (cells) of the closing applied to the wall mask, 0 disables it
    pub gap_closing_radius: u8,
    pub simplification: SimplificationMethod,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_room_area: DEFAULT_MIN_ROOM_AREA,
            max_grid_cells: 4_000_000,
            collinear_tolerance_deg: 1.0,
            right_angle_tolerance_deg: 2.0,
            max_area_drift: 0.01,
            gap_closing_radius: 0,
            simplification: SimplificationMethod::Collinear,
        }
    }
}

impl DetectionConfig {
    pub fn with_min_room_area(mut self, min_room_area: f64) -> Self {
        self.min_room_area = min_room_area;
        self
    }

    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if !self.min_room_area.is_finite() || self.min_room_area < 0.0 {
            return Err(RoomError::InvalidConfig(format!(
                "min_room_area must be finite and non-negative, got {}",
                self.min_room_area
            )));
        }
        if self.max_grid_cells == 0 {
            return Err(RoomError::InvalidConfig("max_grid_cells must be positive".to_string()));
        }
        for (name, value) in [
            ("collinear_tolerance_deg", self.collinear_tolerance_deg),
            ("right_angle_tolerance_deg", self.right_angle_tolerance_deg),
        ] {
            if !value.is_finite() || !(0.0..45.0).contains(&value) {
                return Err(RoomError::InvalidConfig(format!(
                    "{name} must be in [0, 45), got {value}"
                )));
            }
        }
        if !self.max_area_drift.is_finite() || !(0.0..1.0).contains(&self.max_area_drift) {
            return Err(RoomError::InvalidConfig(format!(
                "max_area_drift must be in [0, 1), got {}",
                self.max_area_drift
            )));
        }
        if let SimplificationMethod::DouglasPeucker { epsilon_factor } = self.simplification {
            if !epsilon_factor.is_finite() || epsilon_factor < 0.0 {
                return Err(RoomError::InvalidConfig(format!(
                    "epsilon_factor must be finite and non-negative, got {epsilon_factor}"
                )));
            }
        }
        Ok(())
    }
}
