use bevy::prelude::*;

use crate::car::{Orientation, PlayerControlled};
use crate::constants::{CAMERA_DISTANCE, CAMERA_HEIGHT};
use crate::track::Track;

/// Camera transform for a car at `position` facing `yaw`: a fixed offset
/// above and behind the car, rotated into its frame, looking back at it.
/// There is no smoothing state; the chase camera is this function.
pub fn chase_transform(position: Vec3, yaw: f32) -> Transform {
    let offset = Quat::from_rotation_y(yaw) * Vec3::new(0.0, CAMERA_HEIGHT, -CAMERA_DISTANCE);
    Transform::from_translation(position + offset).looking_at(position, Vec3::Y)
}

/// Spawn the chase camera already placed behind the car's start pose so the
/// first rendered frame matches every later one.
pub fn spawn_chase_camera(mut commands: Commands, track: Res<Track>) {
    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: 75.0_f32.to_radians(),
            near: 0.1,
            far: 1000.0,
            ..default()
        }),
        chase_transform(track.start_position(), track.start_yaw()),
    ));
}

// Camera movement system that rigidly follows the player car
pub fn move_camera(
    player_car: Single<(&Transform, &Orientation), With<PlayerControlled>>,
    camera: Single<&mut Transform, (With<Camera3d>, Without<PlayerControlled>)>,
) {
    let (car_transform, orientation) = player_car.into_inner();
    let mut camera_transform = camera.into_inner();

    *camera_transform = chase_transform(car_transform.translation, orientation.yaw);
}
