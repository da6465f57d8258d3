use macroquad::prelude::*;

use crate::agent::{heading_vector, Agent, SensorReading};
use crate::config::{self, SimConfig};
use crate::error::SimError;
use crate::track::TrackMap;

/// Result of a single raycast.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// Where the ray stopped: on border, or at full length.
    pub tip: Vec2,
    /// Steps walked from the center; the tip's distance from it.
    pub length: u32,
}

impl RayHit {
    pub fn quantized(&self, bucket: u32) -> u32 {
        self.length / bucket
    }
}

/// Walk a ray from `origin` one unit at a time until the pixel under its tip
/// is border or it reaches `max_length`.
pub fn raycast(
    origin: Vec2,
    angle_deg: f32,
    max_length: u32,
    track: &TrackMap,
) -> Result<RayHit, SimError> {
    let dir = heading_vector(angle_deg);
    let mut length = 0u32;
    let mut tip = origin;
    while length < max_length && !track.is_obstacle(tip.x as i64, tip.y as i64)? {
        length += 1;
        tip = origin + dir * length as f32;
    }
    Ok(RayHit { tip, length })
}

/// Cast the full fan for one agent.
pub fn cast_fan(
    center: Vec2,
    heading: f32,
    track: &TrackMap,
    config: &SimConfig,
) -> Result<[RayHit; config::NUM_SENSOR_RAYS], SimError> {
    let mut hits = [RayHit {
        tip: center,
        length: 0,
    }; config::NUM_SENSOR_RAYS];
    for (hit, offset) in hits.iter_mut().zip(config.ray_offsets) {
        *hit = raycast(center, heading + offset, config.ray_length, track)?;
    }
    Ok(hits)
}

/// Refresh the agent's reading and ray tips from scratch.
pub fn sense(
    agent: &mut Agent,
    track: &TrackMap,
    config: &SimConfig,
) -> Result<SensorReading, SimError> {
    let hits = cast_fan(agent.center, agent.heading, track, config)?;
    for (i, hit) in hits.iter().enumerate() {
        agent.reading[i] = hit.quantized(config.sensor_bucket);
        agent.ray_tips[i] = hit.tip;
    }
    Ok(agent.reading)
}
