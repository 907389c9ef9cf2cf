use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};
use crate::systems::layout::SearchMode;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum StatusTone {
    Info,
    Valid,
    Invalid,
}

// fading toast after each regeneration
#[derive(Resource)]
pub struct StatusIndicator {
    pub text: String,
    pub tone: StatusTone,
    pub timer: f32,
    pub duration: f32,
}

impl Default for StatusIndicator {
    fn default() -> Self {
        Self {
            text: String::new(),
            tone: StatusTone::Info,
            timer: 0.0,
            duration: 2.5,
        }
    }
}

#[derive(Event)]
pub struct StatusEvent {
    pub text: String,
    pub tone: StatusTone,
}

#[derive(Resource)]
pub struct SearchModeIndicator {
    pub mode: SearchMode,
    pub timer: f32,
    pub duration: f32,
}

impl Default for SearchModeIndicator {
    fn default() -> Self {
        Self {
            mode: SearchMode::Random,
            timer: 0.0,
            duration: 2.0,
        }
    }
}

#[derive(Event)]
pub struct SearchModeChangeEvent(pub SearchMode);

pub fn mode_style(mode: SearchMode) -> (&'static str, egui::Color32) {
    match mode {
        SearchMode::Random => ("RANDOM SEARCH", egui::Color32::from_rgb(45, 72, 116)),
        SearchMode::Evolve => ("EVOLUTION", egui::Color32::from_rgb(136, 46, 217)),
    }
}

fn tone_color(tone: StatusTone) -> egui::Color32 {
    match tone {
        StatusTone::Info => egui::Color32::from_rgb(40, 44, 52),
        StatusTone::Valid => egui::Color32::from_rgb(34, 139, 34),
        StatusTone::Invalid => egui::Color32::from_rgb(178, 34, 34),
    }
}

fn tick(timer: &mut f32, delta: f32) {
    if *timer > 0.0 {
        *timer = (*timer - delta).max(0.0);
    }
}

pub fn update_status_indicator(
    mut indicator: ResMut<StatusIndicator>,
    mut events: EventReader<StatusEvent>,
    time: Res<Time>,
) {
    for event in events.read() {
        indicator.text = event.text.clone();
        indicator.tone = event.tone;
        indicator.timer = indicator.duration;
    }
    tick(&mut indicator.timer, time.delta_secs());
}

pub fn update_search_mode_indicator(
    mut indicator: ResMut<SearchModeIndicator>,
    mut events: EventReader<SearchModeChangeEvent>,
    time: Res<Time>,
) {
    for event in events.read() {
        indicator.mode = event.0;
        indicator.timer = indicator.duration;
    }
    tick(&mut indicator.timer, time.delta_secs());
}

fn toast(ctx: &egui::Context, id: &str, offset: f32, text: &str, bg_color: egui::Color32, alpha: f32, size: f32) {
    egui::Area::new(egui::Id::new(id))
        .anchor(egui::Align2::CENTER_TOP, egui::vec2(0.0, offset))
        .show(ctx, |ui| {
            let frame = egui::Frame::new()
                .fill(egui::Color32::from_rgba_unmultiplied(
                    bg_color.r(), bg_color.g(), bg_color.b(),
                    (200.0 * alpha) as u8
                ))
                .stroke(egui::Stroke::new(
                    1.5,
                    egui::Color32::from_rgba_unmultiplied(255, 255, 255, (180.0 * alpha) as u8)
                ))
                .inner_margin(egui::Margin::symmetric(16, 8))
                .corner_radius(egui::CornerRadius::same(6));

            frame.show(ui, |ui| {
                ui.label(egui::RichText::new(text)
                    .size(size)
                    .color(egui::Color32::from_rgba_unmultiplied(255, 255, 255, (255.0 * alpha) as u8))
                    .strong());
            });
        });
}

pub fn render_status_indicator(
    indicator: Res<StatusIndicator>,
    mut contexts: EguiContexts,
) {
    if indicator.timer <= 0.0 {
        return;
    }

    if let Ok(ctx) = contexts.ctx_mut() {
        let alpha = (indicator.timer / indicator.duration).clamp(0.0, 1.0);
        toast(ctx, "status_indicator", 60.0, &indicator.text, tone_color(indicator.tone), alpha, 18.0);
    }
}

pub fn render_search_mode_indicator(
    indicator: Res<SearchModeIndicator>,
    mut contexts: EguiContexts,
) {
    if indicator.timer <= 0.0 {
        return;
    }

    if let Ok(ctx) = contexts.ctx_mut() {
        let alpha = (indicator.timer / indicator.duration).clamp(0.0, 1.0);
        let (mode_text, bg_color) = mode_style(indicator.mode);
        toast(ctx, "search_mode_indicator", 110.0, mode_text, bg_color, alpha, 14.0);
    }
}
