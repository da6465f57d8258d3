use macroquad::prelude::*;

use crate::config::SimConfig;
use crate::track::TrackMap;

/// The region agent positions are clamped into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayArea {
    pub min: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl PlayArea {
    pub fn new(width: f32, height: f32, config: &SimConfig) -> Self {
        // The vertical bound reuses the horizontal extent unless told otherwise.
        let y_extent = if config.clamp_y_to_width { width } else { height };
        Self {
            min: config.clamp_min,
            max_x: width - config.clamp_inset,
            max_y: y_extent - config.clamp_inset,
        }
    }

    pub fn for_track(track: &TrackMap, config: &SimConfig) -> Self {
        Self::new(track.width() as f32, track.height() as f32, config)
    }

    /// Clamp each axis independently: lower bound first, then upper.
    pub fn clamp(&self, mut pos: Vec2) -> Vec2 {
        pos.x = pos.x.max(self.min).min(self.max_x);
        pos.y = pos.y.max(self.min).min(self.max_y);
        pos
    }
}
