use bevy::prelude::*;

use crate::config::*;
use crate::systems::ui::indicator::{StatusEvent, StatusTone};
use super::engine::{Layout, RuleConfig};
use super::*;

// entity hierarchy components
#[derive(Component)]
pub struct SiteRoot;

#[derive(Component)]
pub struct BuildingMarker {
    pub index: usize,
    pub kind: usize,
}

// per-type base colors, cycled when there are more types
const TYPE_COLORS: [(f32, f32, f32); 4] = [
    (0.12, 0.47, 0.71),
    (1.0, 0.5, 0.05),
    (0.17, 0.63, 0.17),
    (0.58, 0.40, 0.74),
];

fn type_color(kind: usize) -> (f32, f32, f32) {
    TYPE_COLORS[kind % TYPE_COLORS.len()]
}

fn building_height(kind: usize) -> f32 {
    match kind {
        0 => TOWER_A_HEIGHT,
        1 => TOWER_B_HEIGHT,
        _ => TOWER_B_HEIGHT * 0.75,
    }
}

pub fn spawn_site(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
    layout: &Layout,
    rules: &RuleConfig,
    is_3d: bool,
) {
    let site = rules.site;
    let root = commands.spawn((
        SiteRoot,
        Transform::default(),
        Visibility::Visible,
    )).id();

    // ground slab, top face at y = 0
    let ground_entity = commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(site.width, 0.2, site.depth))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.22, 0.24, 0.22),
            perceptual_roughness: 1.0,
            ..default()
        })),
        Transform::from_translation(ground(site.rect().center(), -0.1)),
    )).id();

    let plaza_rect = rules.plaza.rect();
    let plaza_entity = commands.spawn((
        Mesh3d(meshes.add(Cuboid::new(plaza_rect.width(), 0.1, plaza_rect.height()))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.55, 0.55, 0.55),
            ..default()
        })),
        Transform::from_translation(ground(plaza_rect.center(), 0.05)),
    )).id();

    let mut children = vec![ground_entity, plaza_entity];
    let affected = layout.report().affected_indices();

    for (index, building) in layout.buildings().iter().enumerate() {
        let height = if is_3d { building_height(building.kind) } else { FOOTPRINT_HEIGHT };
        let (mut r, mut g, mut b) = type_color(building.kind);
        if affected.contains(&index) {
            // pull violating buildings toward red
            r = r * 0.4 + 0.6;
            g *= 0.4;
            b *= 0.4;
        }

        let entity = commands.spawn((
            BuildingMarker { index, kind: building.kind },
            Mesh3d(meshes.add(Cuboid::new(building.size.x, height, building.size.y))),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::srgb(r, g, b),
                alpha_mode: AlphaMode::Opaque,
                ..default()
            })),
            Transform::from_translation(ground(building.center(), height * 0.5)),
            Visibility::Visible,
        )).id();
        children.push(entity);
    }

    commands.entity(root).add_children(&children);
}

pub fn handle_regeneration(
    mut commands: Commands,
    mut events: EventReader<RegenerateEvent>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut seed: ResMut<Seed>,
    mut current: ResMut<CurrentLayout>,
    mut hovered: ResMut<HoveredBuilding>,
    mut status_events: EventWriter<StatusEvent>,
    settings: Res<LayoutSettings>,
    query: Query<Entity, With<SiteRoot>>,
    is_3d: Res<crate::systems::ui::Is3D>,
) {
    // several events in one frame collapse into the last one
    let Some(event) = events.read().last() else { return };

    if event.recompute {
        match compute_layout(&settings, event.seed, event.evolve) {
            Ok(next) => {
                seed.0 = event.seed;
                *current = next;
                hovered.0 = None;

                let layout = current.layout();
                debug!(
                    "seed {}: {} buildings, score {:.1}, {} tries",
                    event.seed,
                    layout.len(),
                    layout.score(),
                    current.outcome.tries
                );
                status_events.write(if layout.is_valid() {
                    StatusEvent { text: format!("VALID  {:.0}", layout.score()), tone: StatusTone::Valid }
                } else {
                    StatusEvent {
                        text: format!("INVALID  {} violations", layout.violations().len()),
                        tone: StatusTone::Invalid,
                    }
                });
            }
            Err(e) => {
                warn!("regeneration skipped: {}", e);
                status_events.write(StatusEvent { text: e.to_string(), tone: StatusTone::Invalid });
            }
        }
    }

    // cleanup existing site
    for entity in query.iter() {
        commands.entity(entity).try_despawn();
    }
    spawn_site(&mut commands, &mut meshes, &mut materials, current.layout(), &settings.rules, is_3d.0);
}
