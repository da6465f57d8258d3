// All tunable simulation constants in one place.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

// Agent body
pub const FOOTPRINT_SIDE: f32 = 60.0;
pub const SPAWN_X: f32 = 830.0;
pub const SPAWN_Y: f32 = 920.0;
pub const SPAWN_HEADING: f32 = 0.0;

// Kinematics
pub const CRUISE_SPEED: f32 = 20.0;
pub const MIN_SPEED: f32 = 12.0;
pub const SPEED_STEP: f32 = 2.0;
pub const TURN_STEP: f32 = 10.0;

// Play area
pub const CLAMP_MIN: f32 = 20.0;
pub const CLAMP_INSET: f32 = 120.0;
pub const CLAMP_Y_TO_WIDTH: bool = true;

// Sensors
pub const NUM_SENSOR_RAYS: usize = 5;
pub const SENSOR_RAY_OFFSETS: [f32; NUM_SENSOR_RAYS] = [-90.0, -45.0, 0.0, 45.0, 90.0];
pub const SENSOR_RAY_LENGTH: u32 = 300;
pub const SENSOR_BUCKET: u32 = 30;

// Collision
pub const CORNER_OFFSETS: [f32; 4] = [30.0, 150.0, 210.0, 330.0];

// Generation
pub const TICK_BUDGET: u32 = 30 * 40;

// Track
pub const BORDER_COLOR: [u8; 4] = [255, 255, 255, 255];

/// Runtime view of the constants above, overridable from a JSON file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub footprint_side: f32,
    pub spawn_x: f32,
    pub spawn_y: f32,
    pub spawn_heading: f32,
    pub cruise_speed: f32,
    pub min_speed: f32,
    pub speed_step: f32,
    pub turn_step: f32,
    pub clamp_min: f32,
    /// Distance kept free between the far clamp bound and the track extent.
    pub clamp_inset: f32,
    /// Clamp `y` against the track width instead of its height.
    pub clamp_y_to_width: bool,
    pub ray_offsets: [f32; NUM_SENSOR_RAYS],
    pub ray_length: u32,
    pub sensor_bucket: u32,
    pub corner_offsets: [f32; 4],
    pub tick_budget: u32,
    pub border_color: [u8; 4],
    /// Sweep agents on the rayon pool within each tick.
    pub parallel: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            footprint_side: FOOTPRINT_SIDE,
            spawn_x: SPAWN_X,
            spawn_y: SPAWN_Y,
            spawn_heading: SPAWN_HEADING,
            cruise_speed: CRUISE_SPEED,
            min_speed: MIN_SPEED,
            speed_step: SPEED_STEP,
            turn_step: TURN_STEP,
            clamp_min: CLAMP_MIN,
            clamp_inset: CLAMP_INSET,
            clamp_y_to_width: CLAMP_Y_TO_WIDTH,
            ray_offsets: SENSOR_RAY_OFFSETS,
            ray_length: SENSOR_RAY_LENGTH,
            sensor_bucket: SENSOR_BUCKET,
            corner_offsets: CORNER_OFFSETS,
            tick_budget: TICK_BUDGET,
            border_color: BORDER_COLOR,
            parallel: false,
        }
    }
}

impl SimConfig {
    pub fn from_json_str(text: &str) -> Result<Self, SimError> {
        let config: SimConfig = serde_json::from_str(text)
            .map_err(|e| SimError::InvalidConfig(format!("malformed config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            SimError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    /// Half the footprint side: corner radius and fitness divisor.
    pub fn half_footprint(&self) -> f32 {
        self.footprint_side * 0.5
    }

    /// Largest value a single sensor can report.
    pub fn max_reading(&self) -> u32 {
        self.ray_length / self.sensor_bucket
    }

    pub fn validate(&self) -> Result<(), SimError> {
        let positive = [
            ("footprint_side", self.footprint_side),
            ("cruise_speed", self.cruise_speed),
            ("speed_step", self.speed_step),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimError::InvalidConfig(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        if self.min_speed < 0.0 || self.min_speed > self.cruise_speed {
            return Err(SimError::InvalidConfig(format!(
                "min_speed {} must lie in [0, cruise_speed {}]",
                self.min_speed, self.cruise_speed
            )));
        }
        if self.sensor_bucket == 0 {
            return Err(SimError::InvalidConfig(
                "sensor_bucket must be non-zero".to_string(),
            ));
        }
        if self.tick_budget == 0 {
            return Err(SimError::InvalidConfig(
                "tick_budget must be non-zero".to_string(),
            ));
        }
        if self.clamp_min < 0.0 || self.clamp_inset < 0.0 {
            return Err(SimError::InvalidConfig(
                "clamp bounds must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}
