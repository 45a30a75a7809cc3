use bevy::prelude::*;

use crate::car::{Orientation, Speed};
use crate::constants::{ACCEL_RATE, FRICTION, MAX_SPEED, TURNING_RATE};

/// Input state for the drive simulation, sampled once per frame. Only the
/// current held/released level matters; edge transitions between frames are
/// never observed.
#[derive(Clone, Default)]
pub struct DriveInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

impl DriveInput {
    /// Capture the drive keys currently held. Every other key is ignored.
    pub fn from_keyboard(keys: &ButtonInput<KeyCode>) -> Self {
        Self {
            forward: keys.pressed(KeyCode::KeyW),
            backward: keys.pressed(KeyCode::KeyS),
            left: keys.pressed(KeyCode::KeyA),
            right: keys.pressed(KeyCode::KeyD),
        }
    }
}

/// Advance the car by one frame.
///
/// The whole motion model lives here: yaw from the steering keys, scalar
/// forward speed from throttle/brake with a multiplicative coasting decay,
/// a clamp to the speed bound, then a translation along the current facing
/// direction. Friction applies once per executed frame, not per second, so
/// coasting decay follows FRICTION^n over n frames.
pub fn apply_physics(
    position: &mut Vec3,
    speed: &mut Speed,
    orientation: &mut Orientation,
    input: &DriveInput,
    delta: f32,
) {
    // Steering keys are independent; holding both cancels out
    if input.left {
        orientation.yaw += TURNING_RATE * delta;
    }
    if input.right {
        orientation.yaw -= TURNING_RATE * delta;
    }

    // Throttle wins over brake when both are held
    if input.forward {
        **speed += ACCEL_RATE * delta;
    } else if input.backward {
        **speed -= ACCEL_RATE * delta;
    } else {
        **speed *= FRICTION;
    }
    **speed = speed.clamp(-MAX_SPEED, MAX_SPEED);

    *position += orientation.forward_vector() * **speed * delta;
}
