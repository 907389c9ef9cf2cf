use bevy::prelude::*;
use bevy::window::{Window, PrimaryWindow};
use bevy_egui::EguiContexts;
use bevy_rts_camera::RtsCamera;

use crate::systems::layout::{CurrentLayout, HoveredBuilding};

// screen to world conversion, on 0-plane
// util function
fn screen_to_world_on_plane(
    screen_pos: Vec2,
    camera: &Camera,
    camera_transform: &GlobalTransform,
) -> Option<Vec3> {
    // get ray from camera through the viewport point
    let ray = camera.viewport_to_world(camera_transform, screen_pos).ok()?;

    // intersection with the y=0 plane
    if ray.direction.y.abs() < f32::EPSILON {
        return None; // case that ray is parallel to plane
    }

    let t = -ray.origin.y / ray.direction.y;
    if t < 0.0 {
        return None; // case that intersection behind camera
    }

    Some(ray.origin + ray.direction * t)
}

// index of the footprint under `point`, site coordinates
pub fn building_under(current: &CurrentLayout, point: Vec2) -> Option<usize> {
    current
        .layout()
        .buildings()
        .iter()
        .position(|b| b.rect().contains(point))
}

// hover picking of buildings on the ground plane
pub fn handle_mouse_hover(
    mut hovered: ResMut<HoveredBuilding>,
    mut contexts: EguiContexts,
    current: Res<CurrentLayout>,
    windows: Query<&Window, With<PrimaryWindow>>,
    camera_query: Query<(&Camera, &GlobalTransform), With<RtsCamera>>,
) {
    // pointer over the side panel
    if let Ok(ctx) = contexts.ctx_mut() {
        if ctx.is_pointer_over_area() {
            return;
        }
    }

    let Ok(window) = windows.single() else { return };
    let Ok((camera, camera_transform)) = camera_query.single() else { return };
    let Some(cursor_pos) = window.cursor_position() else {
        hovered.0 = None;
        return;
    };
    let Some(world_pos) = screen_to_world_on_plane(cursor_pos, camera, camera_transform) else { return };

    let next = building_under(&current, Vec2::new(world_pos.x, world_pos.z));
    if hovered.0 != next {
        hovered.0 = next;
    }
}
