use bevy::prelude::*;
use bevy::math::bounding::Aabb2d;
use bevy::pbr::wireframe::{WireframePlugin, WireframeConfig};
use bevy::window::{WindowPlugin, PrimaryWindow};
use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::gizmos::config::{GizmoConfigStore, DefaultGizmoConfigGroup};
use bevy::log::{Level, LogPlugin};
use bevy_egui::EguiPlugin;
use bevy_rts_camera::*;
use clap::Parser;

pub mod cli;
pub mod config;
pub mod systems;

#[cfg(test)]
pub mod test;

// import modules here
use systems::batch::{self, BatchJob};
use systems::grid::GridPlugin;
use systems::layout::{LayoutPlugin, LayoutSettings};

use crate::systems::interaction;
use crate::systems::ui::UIPlugin;

fn main() -> bevy::app::AppExit {
    let cli = cli::Cli::parse();

    // invalid configuration is fatal before any window or search exists
    let job = match cli.resolve() {
        Ok(job) => job,
        Err(e) => {
            eprintln!("invalid configuration: {}", e);
            return AppExit::error();
        }
    };

    let log = log_plugin(cli.verbose);
    if cli.headless {
        run_headless(job, log)
    } else {
        run_viewer(job, log)
    }
}

fn log_plugin(verbose: u8) -> LogPlugin {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    LogPlugin {
        level,
        ..default()
    }
}

// batch run, exits after the startup system
fn run_headless(job: BatchJob, log: LogPlugin) -> AppExit {
    App::new()
        .add_plugins((MinimalPlugins, log))
        .insert_resource(job)
        .add_systems(Startup, batch::run_batch)
        .run()
}

fn run_viewer(job: BatchJob, log: LogPlugin) -> AppExit {
    let site = job.rules.site;
    let settings = LayoutSettings { rules: job.rules, weights: job.weights, run: job.run };

    App::new()
        .add_plugins(DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Plaza Layout Generator".to_string(),
                    mode: bevy::window::WindowMode::Windowed,
                    resolution: bevy::window::WindowResolution::new(1920.0, 1080.0),
                    ..default()
                }),
                ..default()
            })
            .set(log))
        .add_plugins(EguiPlugin::default())
        .add_plugins(FrameTimeDiagnosticsPlugin::default())
        .add_plugins(WireframePlugin::default())
        .add_plugins(RtsCameraPlugin)

        // my custom plugins
        .add_plugins(GridPlugin)
        .add_plugins(LayoutPlugin { settings })
        .add_plugins(UIPlugin)

        .insert_resource(WireframeConfig {
            global: true,
            default_color: Color::BLACK,
        })
        .insert_resource(ClearColor(Color::BLACK)) // world color
        .insert_resource(CameraBounds(Vec2::new(site.width, site.depth)))
        .add_systems(Startup, (start, setup_gizmos, maximize_window))
        .add_systems(Update, (handle_exit, interaction::handle_mouse_hover))
        .run()
}

#[derive(Resource)]
struct CameraBounds(Vec2);

fn setup_gizmos(
    mut config_store: ResMut<GizmoConfigStore>
) {
    let (config, _) = config_store.config_mut::<DefaultGizmoConfigGroup>();
    config.depth_bias = -1.0; // render on top of everything else
}

fn maximize_window(mut windows: Query<&mut Window, With<PrimaryWindow>>) {
    for mut window in windows.iter_mut() {
        window.set_maximized(true);
    }
}

// application entry point here
fn start(
    mut commands: Commands,
    bounds: Res<CameraBounds>,
) {
    let size = bounds.0;

    // spawn camera, bounded to the site and a margin
    commands.spawn((
        RtsCamera {
            bounds: Aabb2d::new(
                size * 0.5,
                size * 0.5 + Vec2::splat(40.0),
            ),
            min_angle: 0.66,
            height_max: size.max_element() * 1.5,
            ..default()
        },
        RtsCameraControls {
            key_up: KeyCode::KeyW,
            key_down: KeyCode::KeyS,
            key_left: KeyCode::KeyA,
            key_right: KeyCode::KeyD,
            key_rotate_left: KeyCode::F24,  // should figure out how to unassign a key :)
            key_rotate_right: KeyCode::F23,
            pan_speed: 60.0,
            zoom_sensitivity: 0.15,
            edge_pan_width: 0.0,
            ..default()
        },
    ));

    // spawn light source
    commands.spawn((
        DirectionalLight {
            illuminance: 1_700.,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(50000.0, 50000.0, 50000.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}

// application exit
fn handle_exit(
    keys: Res<ButtonInput<KeyCode>>,
    mut exit: EventWriter<AppExit>,
) {
    if keys.just_pressed(KeyCode::Escape) {
        exit.write(AppExit::Success);
    }
}
