mod camera;
mod car;
mod constants;
mod minimap;
mod physics;
mod track;

use bevy::prelude::*;
use bevy::window::PresentMode;

use camera::{move_camera, spawn_chase_camera};
use car::{move_player_car, spawn_player_car};
use constants::{WIN_H, WIN_W};
use minimap::{set_minimap_viewport, setup_minimap, update_minimap_marker};
use track::setup_track;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Track Day".into(),
                resolution: (WIN_W, WIN_H).into(),
                present_mode: PresentMode::AutoVsync,
                ..default()
            }),
            ..default()
        }))
        .insert_resource(ClearColor(Color::srgb_u8(0x87, 0xce, 0xeb)))
        .insert_resource(AmbientLight {
            color: Color::srgb_u8(0x66, 0x66, 0x66),
            brightness: 300.0,
            ..default()
        })
        .add_systems(
            Startup,
            (
                setup_scene,
                setup_track,
                spawn_player_car,
                spawn_chase_camera,
                setup_minimap,
            )
                .chain(),
        )
        .add_systems(
            Update,
            (
                (move_player_car, move_camera, update_minimap_marker).chain(),
                set_minimap_viewport,
            ),
        )
        .run();
}

fn setup_scene(mut commands: Commands) {
    commands.spawn((
        DirectionalLight {
            illuminance: 10_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(20.0, 20.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
}
