use crate::agent::{center_of, heading_vector, Action, Agent, Motion};
use crate::config::SimConfig;
use crate::world::PlayArea;

/// Apply a controller's choice to heading or speed.
pub fn apply_action(agent: &mut Agent, action: Action, config: &SimConfig) {
    match action {
        Action::TurnLeft => agent.heading += config.turn_step,
        Action::TurnRight => agent.heading -= config.turn_step,
        Action::SlowDown => {
            if agent.speed - config.speed_step >= config.min_speed {
                agent.speed -= config.speed_step;
            }
        }
        Action::SpeedUp => agent.speed += config.speed_step,
    }
}

/// Move one tick along the heading and clamp into the play area.
///
/// Distance accrues by the full speed even when the clamp eats the motion.
pub fn advance(agent: &mut Agent, area: &PlayArea, config: &SimConfig) {
    if agent.motion == Motion::Uninitialized {
        agent.speed = config.cruise_speed;
        agent.motion = Motion::Cruising;
    }

    let step = heading_vector(agent.heading) * agent.speed;
    agent.pos = area.clamp(agent.pos + step);
    agent.center = center_of(agent.pos, config.half_footprint());

    agent.distance += agent.speed;
    agent.ticks += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use macroquad::prelude::*;

    fn setup() -> (SimConfig, PlayArea) {
        let config = SimConfig::default();
        let area = PlayArea::new(1920.0, 1080.0, &config);
        (config, area)
    }

    #[test]
    fn first_advance_latches_cruise_speed_once() {
        let (config, area) = setup();
        let mut agent = Agent::spawn(&config);

        apply_action(&mut agent, Action::SpeedUp, &config);
        assert_eq!(agent.speed, 2.0);
        advance(&mut agent, &area, &config);
        assert_eq!(agent.speed, 20.0);
        assert_eq!(agent.motion, Motion::Cruising);
        assert_eq!(agent.pos, vec2(850.0, 920.0));

        apply_action(&mut agent, Action::SpeedUp, &config);
        advance(&mut agent, &area, &config);
        assert_eq!(agent.speed, 22.0);
        assert_eq!(agent.distance, 42.0);
        assert_eq!(agent.ticks, 2);
    }

    #[test]
    fn slow_down_respects_floor() {
        let (config, area) = setup();
        let mut agent = Agent::spawn(&config);
        advance(&mut agent, &area, &config);

        for _ in 0..10 {
            apply_action(&mut agent, Action::SlowDown, &config);
            assert!(agent.speed >= 12.0);
        }
        assert_eq!(agent.speed, 12.0);

        apply_action(&mut agent, Action::SlowDown, &config);
        assert_eq!(agent.speed, 12.0);
    }

    #[test]
    fn slow_down_before_motion_is_a_no_op() {
        let (config, _) = setup();
        let mut agent = Agent::spawn(&config);
        apply_action(&mut agent, Action::SlowDown, &config);
        assert_eq!(agent.speed, 0.0);
    }

    #[test]
    fn turns_change_heading_by_fixed_step() {
        let (config, _) = setup();
        let mut agent = Agent::spawn(&config);
        apply_action(&mut agent, Action::TurnLeft, &config);
        apply_action(&mut agent, Action::TurnLeft, &config);
        apply_action(&mut agent, Action::TurnRight, &config);
        assert_eq!(agent.heading, 10.0);
    }

    #[test]
    fn clamped_motion_still_accrues_distance() {
        let (config, area) = setup();
        let mut agent = Agent::at(vec2(25.0, 500.0), 180.0, &config);
        advance(&mut agent, &area, &config);
        assert_eq!(agent.pos.x, 20.0);
        assert_eq!(agent.distance, 20.0);
        assert_eq!(agent.center, vec2(50.0, 530.0));
    }
}
