use macroquad::prelude::*;
use serde::Serialize;

use crate::config::{self, SimConfig};
use crate::error::SimError;

/// Quantized distances, one per sensor ray.
pub type SensorReading = [u32; config::NUM_SENSOR_RAYS];

/// The four discrete controls a controller can choose from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Action {
    TurnLeft,
    TurnRight,
    SlowDown,
    SpeedUp,
}

impl Action {
    pub const ALL: [Action; 4] = [
        Action::TurnLeft,
        Action::TurnRight,
        Action::SlowDown,
        Action::SpeedUp,
    ];

    /// Map an output-neuron index to an action.
    pub fn from_index(index: usize) -> Result<Self, SimError> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(SimError::InvalidAction { index })
    }

    pub fn index(self) -> usize {
        match self {
            Action::TurnLeft => 0,
            Action::TurnRight => 1,
            Action::SlowDown => 2,
            Action::SpeedUp => 3,
        }
    }
}

/// Speed lifecycle: cruise speed is latched exactly once, on the first advance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Motion {
    Uninitialized,
    Cruising,
}

/// Unit vector for a heading in degrees, screen convention (y down,
/// positive angles turn counter-clockwise on screen).
pub fn heading_vector(angle_deg: f32) -> Vec2 {
    let rad = (360.0 - angle_deg).to_radians();
    vec2(rad.cos(), rad.sin())
}

#[derive(Clone, Debug)]
pub struct Agent {
    /// Top-left of the footprint.
    pub pos: Vec2,
    pub center: Vec2,
    /// Degrees, unbounded; only its trigonometry matters.
    pub heading: f32,
    pub speed: f32,
    pub motion: Motion,
    pub alive: bool,
    pub distance: f32,
    pub ticks: u32,
    pub fitness: f32,
    /// Tick at which the agent was eliminated.
    pub died_at: Option<u32>,
    pub reading: SensorReading,
    /// Ray tips that produced `reading`.
    pub ray_tips: [Vec2; config::NUM_SENSOR_RAYS],
    pub corners: [Vec2; 4],
}

impl Agent {
    /// Fresh agent at the configured spawn pose, not yet moving.
    pub fn spawn(config: &SimConfig) -> Self {
        Self::at(vec2(config.spawn_x, config.spawn_y), config.spawn_heading, config)
    }

    pub fn at(pos: Vec2, heading: f32, config: &SimConfig) -> Self {
        let center = center_of(pos, config.half_footprint());
        Self {
            pos,
            center,
            heading,
            speed: 0.0,
            motion: Motion::Uninitialized,
            alive: true,
            distance: 0.0,
            ticks: 0,
            fitness: 0.0,
            died_at: None,
            reading: [0; config::NUM_SENSOR_RAYS],
            ray_tips: [center; config::NUM_SENSOR_RAYS],
            corners: [center; 4],
        }
    }

    /// Reward for the distance covered so far.
    pub fn reward(&self, config: &SimConfig) -> f32 {
        self.distance / config.half_footprint()
    }

    pub fn snapshot(&self, index: usize) -> AgentSnapshot {
        AgentSnapshot {
            index,
            pos: (self.pos.x, self.pos.y),
            center: (self.center.x, self.center.y),
            heading: self.heading,
            speed: self.speed,
            alive: self.alive,
            fitness: self.fitness,
            reading: self.reading,
            ray_tips: self.ray_tips.map(|p| (p.x, p.y)),
            corners: self.corners.map(|p| (p.x, p.y)),
        }
    }
}

/// Center of the footprint whose top-left corner is `pos`. The corner is
/// truncated to whole pixels first so sensor rays start on the grid.
pub fn center_of(pos: Vec2, half_footprint: f32) -> Vec2 {
    vec2(pos.x.trunc() + half_footprint, pos.y.trunc() + half_footprint)
}

/// Read-only copy of an agent handed to observers.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AgentSnapshot {
    pub index: usize,
    pub pos: (f32, f32),
    pub center: (f32, f32),
    pub heading: f32,
    pub speed: f32,
    pub alive: bool,
    pub fitness: f32,
    pub reading: SensorReading,
    pub ray_tips: [(f32, f32); config::NUM_SENSOR_RAYS],
    pub corners: [(f32, f32); 4],
}
