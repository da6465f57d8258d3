use macroquad::prelude::*;

use crate::agent::{heading_vector, Agent};
use crate::config::SimConfig;
use crate::error::SimError;
use crate::track::TrackMap;

/// Corner points of the rotated footprint around `center`.
pub fn footprint_corners(center: Vec2, heading: f32, config: &SimConfig) -> [Vec2; 4] {
    let radius = config.half_footprint();
    config
        .corner_offsets
        .map(|offset| center + heading_vector(heading + offset) * radius)
}

/// Recompute the agent's corners and mark it dead if any lands on border.
///
/// Returns whether the agent survived. Dead agents are left untouched.
pub fn check_collision(
    agent: &mut Agent,
    track: &TrackMap,
    config: &SimConfig,
) -> Result<bool, SimError> {
    if !agent.alive {
        return Ok(false);
    }
    agent.corners = footprint_corners(agent.center, agent.heading, config);
    for corner in agent.corners {
        if track.is_obstacle(corner.x as i64, corner.y as i64)? {
            agent.alive = false;
            break;
        }
    }
    Ok(agent.alive)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_sit_on_half_side_radius() {
        let config = SimConfig::default();
        let center = vec2(100.0, 100.0);
        for corner in footprint_corners(center, 37.0, &config) {
            assert!((corner.distance(center) - 30.0).abs() < 1e-3);
        }
        // Heading 0: first corner is up-right of center on screen.
        let [front_left, ..] = footprint_corners(center, 0.0, &config);
        assert!(front_left.x > center.x && front_left.y < center.y);
    }

    #[test]
    fn clear_ground_keeps_agent_alive() {
        let config = SimConfig::default();
        let track = TrackMap::open(200, 200);
        let mut agent = Agent::at(vec2(70.0, 70.0), 0.0, &config);
        assert!(check_collision(&mut agent, &track, &config).unwrap());
        assert!(agent.alive);
    }

    #[test]
    fn any_corner_on_border_kills() {
        let config = SimConfig::default();
        // Border column at x = 125; the rear corners sit near x = 74.
        let track = TrackMap::from_fn(200, 200, |x, _| x == 125);
        let mut agent = Agent::at(vec2(70.0, 70.0), 0.0, &config);
        agent.center = vec2(100.0, 100.0);
        assert!(!check_collision(&mut agent, &track, &config).unwrap());
        assert!(!agent.alive);
    }

    #[test]
    fn dead_agents_are_not_revived() {
        let config = SimConfig::default();
        let track = TrackMap::open(200, 200);
        let mut agent = Agent::at(vec2(70.0, 70.0), 0.0, &config);
        agent.alive = false;
        assert!(!check_collision(&mut agent, &track, &config).unwrap());
        assert!(!agent.alive);
    }

    #[test]
    fn corner_off_raster_is_an_error() {
        let config = SimConfig::default();
        let track = TrackMap::open(40, 40);
        let mut agent = Agent::at(vec2(0.0, 0.0), 0.0, &config);
        agent.center = vec2(5.0, 5.0);
        let err = check_collision(&mut agent, &track, &config).unwrap_err();
        assert!(matches!(err, SimError::OutOfBoundsQuery { .. }));
    }
}
