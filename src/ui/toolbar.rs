use egui;

use super::{StatusLine, UiState};

/// Slim status strip + compact controls.
pub fn draw_toolbar(ctx: &egui::Context, ui_state: &mut UiState, status: &StatusLine) {
    egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
        ui.add_space(3.0);
        ui.horizontal_wrapped(|ui| {
            title_badge(ui, "TRACKRUNNER");

            ui.separator();
            compact_group(ui, "Sim", |ui| {
                let pause_label = if ui_state.paused { "Play" } else { "Pause" };
                if ui.button(pause_label).clicked() {
                    ui_state.paused = !ui_state.paused;
                }
                if ui.button("Step").clicked() {
                    ui_state.step_requested = true;
                }
            });

            compact_group(ui, "Speed", |ui| {
                for ticks in [1, 2, 5, 20] {
                    speed_button(ui, ui_state, ticks);
                }
            });

            compact_group(ui, "Panels", |ui| {
                ui.toggle_value(&mut ui_state.show_rays, "Rays");
                ui.toggle_value(&mut ui_state.show_graphs, "Graphs");
            });
        });

        ui.add_space(4.0);
        ui.horizontal_wrapped(|ui| {
            metric_chip(ui, "Generation", format!("{}", status.generation));
            metric_chip(
                ui,
                "Tick",
                format!("{}/{}", status.tick, status.tick_budget),
            );
            metric_chip(
                ui,
                "Alive",
                format!("{}/{}", status.alive, status.population),
            );
            metric_chip(ui, "Best", format!("{:.1}", status.best_fitness));
        });
        ui.add_space(3.0);
    });
}

fn speed_button(ui: &mut egui::Ui, ui_state: &mut UiState, ticks: u32) {
    let label = format!("{ticks}x");
    if ui
        .selectable_label(ui_state.ticks_per_frame == ticks, label)
        .clicked()
    {
        ui_state.ticks_per_frame = ticks;
    }
}

fn title_badge(ui: &mut egui::Ui, label: &str) {
    let text = egui::RichText::new(label)
        .strong()
        .color(egui::Color32::from_rgb(190, 220, 255));
    ui.label(text);
}

fn compact_group(ui: &mut egui::Ui, heading: &str, add_contents: impl FnOnce(&mut egui::Ui)) {
    ui.group(|ui| {
        ui.horizontal(|ui| {
            ui.label(
                egui::RichText::new(heading)
                    .small()
                    .color(egui::Color32::from_rgb(150, 170, 185)),
            );
            add_contents(ui);
        });
    });
}

fn metric_chip(ui: &mut egui::Ui, key: &str, value: String) {
    let text = egui::RichText::new(format!("{key}: {value}"))
        .small()
        .color(egui::Color32::from_rgb(205, 215, 225));
    ui.group(|ui| {
        ui.label(text);
    });
}
