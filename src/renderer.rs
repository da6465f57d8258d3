use macroquad::prelude::*;

use trackrunner::agent::AgentSnapshot;
use trackrunner::simulation::TickSnapshot;

const BG_COLOR: Color = Color::new(0.02, 0.03, 0.08, 1.0);
const RAY_COLOR: Color = Color::new(240.0 / 255.0, 1.0, 0.0, 1.0);
const BODY_COLOR: Color = Color::new(0.2, 0.6, 1.0, 0.9);

/// Camera that fits the whole track into the window.
pub fn track_camera(track_size: Vec2) -> Camera2D {
    let zoom = (screen_width() / track_size.x).min(screen_height() / track_size.y);
    Camera2D {
        target: track_size * 0.5,
        zoom: vec2(
            zoom / screen_width() * 2.0,
            -zoom / screen_height() * 2.0,
        ),
        ..Default::default()
    }
}

/// Draw the track and every live agent from a snapshot. Never touches simulation state.
pub fn draw(track: &Texture2D, snapshot: &TickSnapshot, show_rays: bool) {
    clear_background(BG_COLOR);

    let size = vec2(track.width(), track.height());
    set_camera(&track_camera(size));
    draw_texture(track, 0.0, 0.0, WHITE);

    for agent in snapshot.agents.iter().filter(|a| a.alive) {
        draw_agent(agent);
        if show_rays {
            draw_sensor_rays(agent);
        }
    }

    set_default_camera();
    draw_hud(snapshot);
}

fn draw_agent(agent: &AgentSnapshot) {
    let corners = agent.corners.map(|(x, y)| vec2(x, y));
    // Corner order is front-left, rear-left, rear-right, front-right.
    draw_triangle(corners[0], corners[1], corners[2], BODY_COLOR);
    draw_triangle(corners[0], corners[2], corners[3], BODY_COLOR);

    let center = vec2(agent.center.0, agent.center.1);
    let nose = (corners[0] + corners[3]) * 0.5;
    draw_line(center.x, center.y, nose.x, nose.y, 2.0, WHITE);
}

fn draw_sensor_rays(agent: &AgentSnapshot) {
    let (cx, cy) = agent.center;
    for (x, y) in agent.ray_tips {
        draw_line(cx, cy, x, y, 1.0, RAY_COLOR);
        draw_circle(x, y, 5.0, RAY_COLOR);
    }
}

fn draw_hud(snapshot: &TickSnapshot) {
    let tc = Color::new(0.95, 0.97, 1.0, 1.0);
    let sh = Color::new(0.0, 0.0, 0.0, 0.8);

    let cx = screen_width() * 0.5;
    let cy = screen_height() * 0.5;

    let gen_text = format!("Generation: {}", snapshot.generation);
    let tw = measure_text(&gen_text, None, 30, 1.0).width;
    draw_text(&gen_text, cx - tw * 0.5 + 1.0, cy - 19.0, 30.0, sh);
    draw_text(&gen_text, cx - tw * 0.5, cy - 20.0, 30.0, tc);

    let alive_text = format!("Still Alive: {}", snapshot.alive);
    let tw = measure_text(&alive_text, None, 20, 1.0).width;
    draw_text(&alive_text, cx - tw * 0.5 + 1.0, cy + 21.0, 20.0, sh);
    draw_text(&alive_text, cx - tw * 0.5, cy + 20.0, 20.0, tc);

    let tick_text = format!("Tick: {}  FPS: {}", snapshot.tick, get_fps());
    draw_text(&tick_text, 11.0, 21.0, 18.0, sh);
    draw_text(&tick_text, 10.0, 20.0, 18.0, tc);
}
