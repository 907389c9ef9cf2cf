// this is the entry point for the layout plugin
use bevy::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

pub mod engine;
pub mod site;

use engine::*;

// resources
#[derive(Resource)]
pub struct Seed(pub u64);

/// Rules, weights and run parameters the viewer searches with.
/// Sliders mutate `run`, the rules stay fixed for the session.
#[derive(Resource, Clone, Debug)]
pub struct LayoutSettings {
    pub rules: RuleConfig,
    pub weights: ScoreWeights,
    pub run: RunParams,
}

#[derive(Resource, Clone, Debug)]
pub struct CurrentLayout {
    pub seed: u64,
    pub outcome: GenerationOutcome,
    pub evolution: Option<EvolutionOutcome>,
}

impl CurrentLayout {
    // the evolved layout when evolution ran, the search result otherwise
    pub fn layout(&self) -> &Layout {
        match &self.evolution {
            Some(evolved) => &evolved.best,
            None => &self.outcome.layout,
        }
    }
}

#[derive(Resource, Default)]
pub struct HoveredBuilding(pub Option<usize>);

// search mode
#[derive(Resource, Default, Clone, Copy, PartialEq, Debug)]
pub enum SearchMode {
    #[default]
    Random,
    Evolve,
}

// Event for regeneration
#[derive(Event)]
pub struct RegenerateEvent {
    pub seed: u64,
    pub evolve: bool,
    /// false only redraws the current layout, e.g. after a view toggle
    pub recompute: bool,
}

pub fn compute_layout(settings: &LayoutSettings, seed: u64, evolve: bool) -> Result<CurrentLayout, ConfigError> {
    let generator = Generator::new(&settings.rules, &settings.weights, settings.run.search)?;
    let mut rng = StdRng::seed_from_u64(seed);
    let outcome = generator.generate(&mut rng);

    let evolution = if evolve {
        let optimizer = Optimizer::new(&generator, settings.run.evolution)?;
        Some(optimizer.run(Some(outcome.layout.clone()), &mut rng))
    } else {
        None
    };

    Ok(CurrentLayout { seed, outcome, evolution })
}

// main plugin for layout generation
pub struct LayoutPlugin {
    pub settings: LayoutSettings,
}

impl Plugin for LayoutPlugin {
    fn build(&self, app: &mut App) {
        let settings = self.settings.clone();
        let seed = settings.run.seed;
        let mode = if settings.run.evolution.enabled { SearchMode::Evolve } else { SearchMode::Random };

        let current = match compute_layout(&settings, seed, mode == SearchMode::Evolve) {
            Ok(current) => current,
            Err(e) => {
                error!("initial layout failed: {}", e);
                CurrentLayout {
                    seed,
                    outcome: GenerationOutcome {
                        layout: Layout::empty(&settings.rules, &settings.weights),
                        target: settings.run.search.min_buildings,
                        tries: 0,
                        stop: StopReason::Exhausted,
                    },
                    evolution: None,
                }
            }
        };

        app
            .insert_resource(Seed(seed))
            .insert_resource(mode)
            .insert_resource(current)
            .insert_resource(settings)
            .insert_resource(HoveredBuilding::default())

            .add_event::<RegenerateEvent>()
            .add_event::<crate::systems::export::ExportEvent>()

            .add_systems(Startup, |mut commands: Commands,
                                   mut meshes: ResMut<Assets<Mesh>>,
                                   mut materials: ResMut<Assets<StandardMaterial>>,
                                   current: Res<CurrentLayout>,
                                   settings: Res<LayoutSettings>,
                                   is_3d: Res<crate::systems::ui::Is3D>| {
                site::spawn_site(&mut commands, &mut meshes, &mut materials, current.layout(), &settings.rules, is_3d.0);
            })
            .add_systems(Update, (debug_gizmos, site::handle_regeneration, crate::systems::export::handle_export));
    }
}

// site coordinates lie on the ground plane, site y maps to world z
pub fn ground(p: Vec2, height: f32) -> Vec3 {
    Vec3::new(p.x, height, p.y)
}

fn rect_outline(gizmos: &mut Gizmos, rect: Rect, height: f32, color: Color) {
    let corners = [
        rect.min,
        Vec2::new(rect.max.x, rect.min.y),
        rect.max,
        Vec2::new(rect.min.x, rect.max.y),
    ];
    for i in 0..4 {
        gizmos.line(ground(corners[i], height), ground(corners[(i + 1) % 4], height), color);
    }
}

fn dashed_rect(gizmos: &mut Gizmos, rect: Rect, height: f32, color: Color) {
    let corners = [
        rect.min,
        Vec2::new(rect.max.x, rect.min.y),
        rect.max,
        Vec2::new(rect.min.x, rect.max.y),
    ];
    let dash_length = 2.0f32;
    let gap_length = 1.5f32;

    for i in 0..4 {
        let start = corners[i];
        let end = corners[(i + 1) % 4];
        let total_length = start.distance(end);
        if total_length < 0.001 {
            continue;
        }
        let direction = (end - start) / total_length;

        let mut current_distance = 0.0;
        while current_distance < total_length {
            let dash_start = start + direction * current_distance;
            let dash_end = dash_start + direction * dash_length.min(total_length - current_distance);
            gizmos.line(ground(dash_start, height), ground(dash_end, height), color);
            current_distance += dash_length + gap_length;
        }
    }
}

// footprint grown by `radius` in edge distance, a rectangle with quarter-circle corners
fn radius_outline(gizmos: &mut Gizmos, rect: Rect, radius: f32, height: f32, color: Color) {
    const ARC_SEGMENTS: usize = 8;
    let corners = [
        (Vec2::new(rect.max.x, rect.max.y), 0.0f32),
        (Vec2::new(rect.min.x, rect.max.y), 0.5),
        (Vec2::new(rect.min.x, rect.min.y), 1.0),
        (Vec2::new(rect.max.x, rect.min.y), 1.5),
    ];

    let mut outline = Vec::with_capacity(4 * (ARC_SEGMENTS + 1));
    for (corner, start) in corners {
        for step in 0..=ARC_SEGMENTS {
            let angle = (start + 0.5 * step as f32 / ARC_SEGMENTS as f32) * std::f32::consts::PI;
            outline.push(corner + Vec2::new(angle.cos(), angle.sin()) * radius);
        }
    }
    for i in 0..outline.len() {
        gizmos.line(ground(outline[i], height), ground(outline[(i + 1) % outline.len()], height), color);
    }
}

fn debug_gizmos(
    mut gizmos: Gizmos,
    current: Res<CurrentLayout>,
    settings: Res<LayoutSettings>,
    gizmos_visible: Res<crate::systems::ui::GizmosVisible>,
    hovered: Res<HoveredBuilding>,
) {
    if !gizmos_visible.0 {
        return;
    }

    let rules = &settings.rules;
    let layout = current.layout();
    let buildings = layout.buildings();

    // site edge and setback line
    rect_outline(&mut gizmos, rules.site.rect(), 0.05, Color::srgba(1.0, 1.0, 1.0, 0.6));
    dashed_rect(&mut gizmos, rules.buildable(), 0.05, Color::srgba(0.71, 0.24, 0.24, 0.7));

    // violating buildings
    let affected = layout.report().affected_indices();
    for &index in &affected {
        if let Some(building) = buildings.get(index) {
            // thick outline with multiple offset rects
            for offset in [0.0, 0.3, 0.6] {
                let grown = Rect {
                    min: building.rect().min - Vec2::splat(offset),
                    max: building.rect().max + Vec2::splat(offset),
                };
                rect_outline(&mut gizmos, grown, 0.1, Color::srgba(1.0, 0.1, 0.1, 0.9));
            }
        }
    }

    // spacing conflicts between pairs
    for violation in layout.violations() {
        if let Violation::Spacing { first, second, .. } = *violation {
            if let (Some(a), Some(b)) = (buildings.get(first), buildings.get(second)) {
                gizmos.line(ground(a.center(), 0.2), ground(b.center(), 0.2), Color::srgba(1.0, 0.3, 0.3, 0.9));
            }
        }
    }

    // neighborhood of the hovered building
    let Some(index) = hovered.0 else { return };
    let Some(building) = buildings.get(index) else { return };

    rect_outline(&mut gizmos, building.rect(), 0.15, Color::srgba(1.0, 1.0, 0.0, 0.9));
    radius_outline(&mut gizmos, building.rect(), rules.neighbor_radius, 0.05, Color::srgba(1.0, 1.0, 0.0, 0.4));

    let nearest = buildings
        .iter()
        .enumerate()
        .filter(|(i, other)| *i != index && other.kind != building.kind)
        .map(|(_, other)| (other, engine::rules::edge_distance(building, other)))
        .min_by(|a, b| a.1.total_cmp(&b.1));
    if let Some((other, distance)) = nearest {
        let color = if distance <= rules.neighbor_radius {
            Color::srgba(0.24, 0.75, 0.31, 0.9) // green, mix satisfied
        } else {
            Color::srgba(1.0, 0.5, 0.0, 0.9) // orange, too far
        };
        gizmos.line(ground(building.center(), 0.25), ground(other.center(), 0.25), color);
    }
}
