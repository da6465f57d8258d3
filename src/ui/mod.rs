pub mod graphs;
pub mod toolbar;

use trackrunner::stats::RunStats;

/// Viewer controls shared between the egui panels and the frame loop.
pub struct UiState {
    pub paused: bool,
    pub show_rays: bool,
    pub show_graphs: bool,
    pub ticks_per_frame: u32,
    pub step_requested: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            paused: false,
            show_rays: true,
            show_graphs: true,
            ticks_per_frame: 1,
            step_requested: false,
        }
    }
}

/// Live numbers for the status strip.
pub struct StatusLine {
    pub generation: u64,
    pub tick: u32,
    pub tick_budget: u32,
    pub alive: usize,
    pub population: usize,
    pub best_fitness: f32,
}

/// Draw all egui UI panels.
pub fn draw_ui(ui_state: &mut UiState, status: &StatusLine, stats: &RunStats) {
    egui_macroquad::ui(|ctx| {
        toolbar::draw_toolbar(ctx, ui_state, status);

        if ui_state.show_graphs {
            graphs::draw_graphs(ctx, stats);
        }
    });

    egui_macroquad::draw();
}
