use bevy::prelude::*;
use bevy::gizmos::config::{GizmoConfigGroup, GizmoConfigStore};

use crate::systems::layout::{ground, LayoutSettings};

// a metric grid over the site and a margin around it
// so user can read distances and setbacks off the ground
pub struct GridPlugin;

#[derive(Default, Reflect, GizmoConfigGroup)]
pub struct GridGizmoGroup;

impl Plugin for GridPlugin {
    fn build(&self, app: &mut App) {
        app
            .insert_resource(GridConfig::default())
            .init_gizmo_group::<GridGizmoGroup>()
            .add_systems(Startup, setup_gizmos)
            .add_systems(Update, draw_grid);
    }
}

// setting theese parameters as a resource allows for runtime modifications
#[derive(Resource)]
pub struct GridConfig {
    pub major_spacing: f32,
    pub minor_spacing: f32,
    pub major_color: Color,
    pub minor_color: Color,
    pub margin: f32,
    pub enabled: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            major_spacing: 10.0,
            minor_spacing: 5.0,
            major_color: Color::srgba(0.5, 0.5, 0.5, 0.25),
            minor_color: Color::srgba(0.3, 0.3, 0.3, 0.1),
            margin: 40.0,
            enabled: true,
        }
    }
}

fn setup_gizmos(
    mut config_store: ResMut<GizmoConfigStore>
) {
    let (config, _) = config_store.config_mut::<GridGizmoGroup>();
    config.depth_bias = 0.1; // render depth
}

/// Grid line positions from `min` to `max` on multiples of `spacing`.
pub fn grid_lines(min: f32, max: f32, spacing: f32) -> Vec<f32> {
    if spacing <= 0.0 {
        return Vec::new();
    }
    let first = (min / spacing).ceil() as i64;
    let last = (max / spacing).floor() as i64;
    (first..=last).map(|i| i as f32 * spacing).collect()
}

fn draw_grid(
    mut gizmos: Gizmos<GridGizmoGroup>,
    params: Res<GridConfig>,
    settings: Res<LayoutSettings>,
) {
    if !params.enabled {
        return;
    }

    let site = settings.rules.site.rect();
    let min = site.min - Vec2::splat(params.margin);
    let max = site.max + Vec2::splat(params.margin);

    for (spacing, color, height) in [
        (params.minor_spacing, params.minor_color, 0.01),
        (params.major_spacing, params.major_color, 0.02),
    ] {
        for x in grid_lines(min.x, max.x, spacing) {
            gizmos.line(ground(Vec2::new(x, min.y), height), ground(Vec2::new(x, max.y), height), color);
        }
        for z in grid_lines(min.y, max.y, spacing) {
            gizmos.line(ground(Vec2::new(min.x, z), height), ground(Vec2::new(max.x, z), height), color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_land_on_spacing_multiples() {
        assert_eq!(grid_lines(-12.0, 21.0, 10.0), vec![-10.0, 0.0, 10.0, 20.0]);
        assert!(grid_lines(0.0, 10.0, 0.0).is_empty());
    }
}
