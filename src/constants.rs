// Window constants
pub const WIN_W: f32 = 1280.;
pub const WIN_H: f32 = 720.;

// Physics constants
pub const ACCEL_RATE: f32 = 20.0;
pub const MAX_SPEED: f32 = 35.0;
pub const TURNING_RATE: f32 = 1.8;
pub const FRICTION: f32 = 0.97;

// Chase camera constants
pub const CAMERA_DISTANCE: f32 = 8.0;
pub const CAMERA_HEIGHT: f32 = 4.0;

// Track constants
pub const TRACK_SUBDIVISIONS: usize = 500;
pub const ROAD_WIDTH: f32 = 5.2;
pub const FIT_MARGIN: f32 = 0.9;

// Minimap constants
pub const MINIMAP_SIZE: f32 = 200.0;
pub const MINIMAP_PADDING: f32 = 16.0;
pub const MINIMAP_LINE_WIDTH: f32 = 3.0;
pub const MINIMAP_MARKER_RADIUS: f32 = 4.0;
