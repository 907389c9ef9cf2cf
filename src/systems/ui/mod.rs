use bevy::prelude::*;
use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin}; // fps
use bevy_egui::{egui, EguiContexts, EguiPlugin, EguiPrimaryContextPass};
use crate::systems::layout::{CurrentLayout, HoveredBuilding, LayoutSettings, RegenerateEvent, SearchMode, Seed};
use crate::systems::layout::engine::StopReason;
use crate::systems::layout::engine::rules::nearest_other_kind;
use crate::systems::export::ExportEvent;

pub mod indicator;

// re-export the main items that other modules need
pub use indicator::{StatusIndicator, StatusEvent, SearchModeIndicator, SearchModeChangeEvent};
pub use indicator::{update_status_indicator, render_status_indicator, update_search_mode_indicator, render_search_mode_indicator};

#[derive(Resource)]
pub struct GizmosVisible(pub bool);

#[derive(Resource)]
pub struct Is3D(pub bool);

pub struct UIPlugin;

impl Plugin for UIPlugin {
    fn build(&self, app: &mut App) {
        assert!(app.is_plugin_added::<EguiPlugin>());
        app
            .insert_resource(GizmosVisible(true))
            .insert_resource(Is3D(true))
            .insert_resource(StatusIndicator::default())
            .insert_resource(SearchModeIndicator::default())
            .add_event::<StatusEvent>()
            .add_event::<SearchModeChangeEvent>()
            .add_systems(Update, (key_input, update_status_indicator, update_search_mode_indicator))
            .add_systems(EguiPrimaryContextPass, (ui_main, fps, render_status_indicator, render_search_mode_indicator)); // UI rendering here
    }
}

fn key_input(
    keyboard_input: Res<ButtonInput<KeyCode>>,
    mut search_mode: ResMut<SearchMode>,
    mut gizmos_visible: ResMut<GizmosVisible>,
    mut mode_events: EventWriter<SearchModeChangeEvent>,
    mut regen_events: EventWriter<RegenerateEvent>,
    current_seed: Res<Seed>,
) {
    if keyboard_input.just_pressed(KeyCode::Tab) {
        *search_mode = match *search_mode {
            SearchMode::Random => SearchMode::Evolve,
            SearchMode::Evolve => SearchMode::Random,
        };
        mode_events.write(SearchModeChangeEvent(*search_mode));
    }

    if keyboard_input.just_pressed(KeyCode::KeyG) {
        gizmos_visible.0 = !gizmos_visible.0;
    }

    let evolve = *search_mode == SearchMode::Evolve;
    if keyboard_input.just_pressed(KeyCode::KeyR) {
        regen_events.write(RegenerateEvent { seed: rand::random(), evolve, recompute: true });
    }
    // evolve the current seed without changing it
    if keyboard_input.just_pressed(KeyCode::Space) {
        regen_events.write(RegenerateEvent { seed: current_seed.0, evolve, recompute: true });
    }
}

fn ui_main(
    mut contexts: EguiContexts,
    current_seed: Res<Seed>,
    mut settings: ResMut<LayoutSettings>,
    mut regen_events: EventWriter<RegenerateEvent>,
    mut export_events: EventWriter<ExportEvent>,
    search_mode: Res<SearchMode>,
    mut is_3d: ResMut<Is3D>,
    mut gizmos_visible: ResMut<GizmosVisible>,
    current: Res<CurrentLayout>,
    hovered: Res<HoveredBuilding>,
) {
    if let Ok(ctx) = contexts.ctx_mut() {
        egui::SidePanel::left("config_panel")
            .default_width(200.0)
            .min_width(280.0)
            .max_width(420.0)
            .resizable(true)
            .show(ctx, |ui| {
                let mut regenerate = false;
                let evolve = *search_mode == SearchMode::Evolve;

                // camera
                ui.label("Camera: ");
                ui.label("WASD - Move");
                ui.label("Scroll - Zoom");
                ui.label("MMB - Rotate");

                ui.separator();

                // search mode
                ui.label("Search Mode:");
                ui.horizontal(|ui| {
                    let (mode_text, bg_color) = indicator::mode_style(*search_mode);

                    let frame = egui::Frame::new()
                        .fill(bg_color)
                        .inner_margin(egui::Margin::symmetric(4, 1))
                        .corner_radius(egui::CornerRadius::same(3));

                    frame.show(ui, |ui| {
                        ui.label(egui::RichText::new(mode_text)
                            .size(12.0)
                            .color(egui::Color32::WHITE)
                            .strong());
                    });

                    ui.label("(TAB to switch)");
                });

                ui.separator();

                // visibility controls
                ui.label("Layer Visibility:");
                if ui.checkbox(&mut is_3d.0, "3D")
                    .on_hover_text("Toggle between footprints and extruded towers")
                    .changed() {
                    regen_events.write(RegenerateEvent { seed: current_seed.0, evolve, recompute: false });
                }
                ui.checkbox(&mut gizmos_visible.0, "Rule overlay (G)")
                    .on_hover_text("Setback line, violations and the neighbor radius of the hovered building");

                ui.separator();

                ui.label("Search Parameters:");

                // seed
                egui::CollapsingHeader::new("Seed")
                    .default_open(true)
                    .show(ui, |ui| {
                    ui.label(format!("Current: {}", current_seed.0));

                    ui.horizontal(|ui| {
                        if ui.button("Regenerate (R)").clicked() {
                            let new_seed = rand::random();
                            regen_events.write(RegenerateEvent { seed: new_seed, evolve, recompute: true });
                        }
                        if evolve {
                            let button = egui::Button::new("Evolve (Space)")
                                .fill(egui::Color32::from_rgb(136, 46, 217));
                            if ui.add(button).clicked() {
                                regen_events.write(RegenerateEvent { seed: current_seed.0, evolve, recompute: true });
                            }
                        }
                    });
                });

                let search = &mut settings.run.search;
                egui::CollapsingHeader::new("Random Search")
                    .default_open(true)
                    .show(ui, |ui| {
                    let max_limit = search.max_buildings.max(1);
                    regenerate |= ui.add(egui::Slider::new(&mut search.min_buildings, 1..=max_limit)
                        .text("Min Buildings"))
                        .on_hover_text("Smallest building count a layout must reach to be accepted.")
                        .changed();
                    let min_limit = search.min_buildings;
                    regenerate |= ui.add(egui::Slider::new(&mut search.max_buildings, min_limit..=30)
                        .text("Max Buildings"))
                        .on_hover_text("Largest building count drawn for a try.")
                        .changed();
                    regenerate |= ui.add(egui::Slider::new(&mut search.attempts_per_building, 10..=500)
                        .text("Attempts per Building"))
                        .on_hover_text("Random positions tried for each slot before it is skipped.")
                        .changed();
                    regenerate |= ui.add(egui::Slider::new(&mut search.fill_extra, 0..=10)
                        .text("Fill Extra"))
                        .on_hover_text("Additional buildings placed greedily after the main pass.")
                        .changed();
                    regenerate |= ui.add(egui::Slider::new(&mut search.max_tries, 1..=2000)
                        .text("Max Tries"))
                        .on_hover_text("Full layout drafts before the best invalid try is kept.")
                        .changed();
                });

                if evolve {
                    let evolution = &mut settings.run.evolution;
                    egui::CollapsingHeader::new("Evolution")
                        .default_open(true)
                        .show(ui, |ui| {
                        regenerate |= ui.add(egui::Slider::new(&mut evolution.generations, 1..=300)
                            .text("Generations"))
                            .changed();
                        regenerate |= ui.add(egui::Slider::new(&mut evolution.population_size, 2..=60)
                            .text("Population"))
                            .changed();
                        regenerate |= ui.add(egui::Slider::new(&mut evolution.mutation_rate, 0.0..=1.0)
                            .text("Mutation Rate"))
                            .on_hover_text("Probability of each mutation operator per child.")
                            .changed();
                    });
                }

                ui.separator();

                // result summary
                let layout = current.layout();
                let rules = &settings.rules;
                egui::CollapsingHeader::new("Result")
                    .default_open(true)
                    .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.label("Layout:");
                        let (status_text, status_color) = if layout.is_valid() {
                            ("Valid", egui::Color32::from_rgb(34, 139, 34))
                        } else {
                            ("Invalid", egui::Color32::from_rgb(178, 34, 34))
                        };
                        ui.label(egui::RichText::new(status_text).color(status_color));
                    });

                    let score = layout.breakdown();
                    ui.label(format!("Score: {:.1}", layout.score()));
                    ui.label(format!(
                        "count {:.0} | area {:.0} | spread {:.1} | balance {:.1}",
                        score.count, score.area, score.distribution, score.balance
                    ));

                    let counts: Vec<String> = rules.building_types.iter().enumerate()
                        .map(|(kind, ty)| format!("{} {}", layout.count_of(kind), ty.label))
                        .collect();
                    ui.label(format!(
                        "Buildings: {} of {} ({})",
                        layout.len(),
                        current.outcome.target,
                        counts.join(", ")
                    ));
                    ui.label(format!("Built area: {:.0} m²", layout.total_area()));

                    let stop = match current.outcome.stop {
                        StopReason::Accepted => "accepted",
                        StopReason::Exhausted => "exhausted",
                    };
                    ui.label(format!("Search: {} after {} tries", stop, current.outcome.tries));

                    if let Some(evolved) = &current.evolution {
                        ui.label(format!(
                            "Evolution: {:.1} -> {:.1} over {} generations",
                            evolved.initial_best(),
                            evolved.best.score(),
                            evolved.history.len().saturating_sub(1)
                        ));
                    }
                });

                if !layout.is_valid() {
                    egui::CollapsingHeader::new(format!("Violations ({})", layout.violations().len()))
                        .default_open(true)
                        .show(ui, |ui| {
                        for violation in layout.violations() {
                            ui.label(egui::RichText::new(violation.to_string())
                                .color(egui::Color32::from_rgb(230, 120, 120)));
                        }
                    });
                }

                // hovered building
                if let Some(building) = hovered.0.and_then(|i| layout.buildings().get(i).map(|b| (i, b))) {
                    let (index, building) = building;
                    ui.separator();
                    ui.label(format!(
                        "Building {} ({}) at ({:.1}, {:.1}), {:.0} x {:.0}",
                        index,
                        rules.label(building.kind),
                        building.origin.x,
                        building.origin.y,
                        building.size.x,
                        building.size.y
                    ));
                    match nearest_other_kind(index, layout.buildings()) {
                        Some(distance) => ui.label(format!(
                            "Nearest other type: {:.1} m (radius {:.0} m)",
                            distance, rules.neighbor_radius
                        )),
                        None => ui.label("No building of another type"),
                    };
                    for violation in layout.report().for_building(index) {
                        ui.label(format!("  {}", violation));
                    }
                }

                ui.separator();

                // export section
                ui.horizontal(|ui| {
                    if ui.button("Export JSON")
                        .on_hover_text("Export the current layout as JSON, current directory")
                        .clicked() {
                        // filename with timestamp
                        let timestamp = std::time::SystemTime::now()
                            .duration_since(std::time::UNIX_EPOCH)
                            .map(|d| d.as_secs())
                            .unwrap_or(0);
                        let filename = format!("layout_{}_{}.json", current_seed.0, timestamp);
                        export_events.write(ExportEvent { filename });
                    }
                });

                ui.separator();
                ui.label("ESC - Exit");

                // trigger regeneration on any parameter change
                if regenerate {
                    regen_events.write(RegenerateEvent { seed: current_seed.0, evolve, recompute: true });
                }
            });
    }
}

fn fps(
    mut contexts: EguiContexts,
    diagnostics: Res<DiagnosticsStore>,
) {
    if let Ok(ctx) = contexts.ctx_mut() {
        egui::Area::new(egui::Id::new("fps_counter"))
            .anchor(egui::Align2::RIGHT_TOP, egui::Vec2::new(-10.0, 10.0))
            .show(ctx, |ui| {
                ui.with_layout(egui::Layout::top_down(egui::Align::RIGHT), |ui| {
                    if let Some(fps_diagnostic) = diagnostics.get(&FrameTimeDiagnosticsPlugin::FPS) {
                        if let Some(fps) = fps_diagnostic.smoothed() {
                            ui.label(egui::RichText::new(format!("{:.0}", fps))
                                .size(26.0)
                                .color(egui::Color32::WHITE));
                        }
                    }
                });
            });
    }
}
