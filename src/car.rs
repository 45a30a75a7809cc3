use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;

use crate::physics::{DriveInput, apply_physics};
use crate::track::Track;

// Car-related components
#[derive(Component)]
pub struct Car;

#[derive(Component)]
pub struct PlayerControlled;

/// Facing direction as a single yaw angle about +Y. The car never pitches
/// or rolls.
#[derive(Component, Clone)]
pub struct Orientation {
    pub yaw: f32,
}

impl Orientation {
    pub fn new(yaw: f32) -> Self {
        Self { yaw }
    }

    /// Unit vector the car is facing, in the ground plane.
    pub fn forward_vector(&self) -> Vec3 {
        Vec3::new(self.yaw.sin(), 0.0, self.yaw.cos())
    }
}

/// Signed scalar forward speed in world units per second. Negative while
/// reversing.
#[derive(Component, Clone, Deref, DerefMut)]
pub struct Speed {
    pub speed: f32,
}

impl Speed {
    pub fn new() -> Self {
        Self { speed: 0.0 }
    }
}

/// Per-frame vehicle update: sample the held keys, integrate the motion
/// model, then write the result back to the car's transform.
pub fn move_player_car(
    time: Res<Time>,
    input: Res<ButtonInput<KeyCode>>,
    player_car: Single<(&mut Transform, &mut Speed, &mut Orientation), With<PlayerControlled>>,
) {
    let (mut transform, mut speed, mut orientation) = player_car.into_inner();

    let drive = DriveInput::from_keyboard(&input);

    let mut position = transform.translation;
    apply_physics(
        &mut position,
        &mut speed,
        &mut orientation,
        &drive,
        time.delta_secs(),
    );

    transform.translation = position;
    transform.rotation = Quat::from_rotation_y(orientation.yaw);
}

/// Spawn the player car at the start of the loop, facing along it. The body
/// is a handful of primitive meshes parented to one entity that owns the
/// simulation state.
pub fn spawn_player_car(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    track: Res<Track>,
) {
    let start = track.start_position();
    let yaw = track.start_yaw();

    let body_material = materials.add(Color::srgb_u8(0xff, 0x44, 0x44));
    let cabin_material = materials.add(Color::srgb_u8(0x33, 0x33, 0x33));
    let wheel_material = materials.add(Color::srgb_u8(0x22, 0x22, 0x22));
    let wheel_mesh = meshes.add(Cylinder::new(0.3, 0.2));

    commands
        .spawn((
            Transform::from_translation(start).with_rotation(Quat::from_rotation_y(yaw)),
            Visibility::default(),
            Speed::new(),
            Orientation::new(yaw),
            Car,
            PlayerControlled,
        ))
        .with_children(|parent| {
            parent.spawn((
                Mesh3d(meshes.add(Cuboid::new(1.5, 0.8, 3.0))),
                MeshMaterial3d(body_material),
                Transform::from_xyz(0.0, 0.4, 0.0),
            ));
            parent.spawn((
                Mesh3d(meshes.add(Cuboid::new(1.3, 0.8, 1.8))),
                MeshMaterial3d(cabin_material),
                Transform::from_xyz(0.0, 1.0, -0.2),
            ));
            // Wheel cylinders are modelled along +Y, so lay them on their side
            for (x, z) in [(0.76, 1.0), (-0.76, 1.0), (0.76, -1.0), (-0.76, -1.0)] {
                parent.spawn((
                    Mesh3d(wheel_mesh.clone()),
                    MeshMaterial3d(wheel_material.clone()),
                    Transform::from_xyz(x, 0.3, z)
                        .with_rotation(Quat::from_rotation_z(FRAC_PI_2)),
                ));
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_vector_at_zero_yaw() {
        let orientation = Orientation::new(0.0);
        let forward = orientation.forward_vector();

        assert!((forward - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_forward_vector_rotates_counterclockwise() {
        // A quarter turn to the left swings the heading from +Z to +X
        let orientation = Orientation::new(FRAC_PI_2);
        let forward = orientation.forward_vector();

        assert!((forward - Vec3::X).length() < 1e-6);
    }

    #[test]
    fn test_forward_vector_is_horizontal_unit() {
        for yaw in [0.3, 1.2, 2.8, -0.7] {
            let forward = Orientation::new(yaw).forward_vector();
            assert_eq!(forward.y, 0.0);
            assert!((forward.length() - 1.0).abs() < 1e-6);
        }
    }
}
