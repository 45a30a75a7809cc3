use std::fmt;

use bevy::asset::RenderAssetUsages;
use bevy::math::cubic_splines::{
    CubicCardinalSpline, CubicCurve, CyclicCubicGenerator, InsufficientDataError,
};
use bevy::prelude::*;
use bevy::render::mesh::Indices;
use bevy::render::render_resource::PrimitiveTopology;

use crate::constants::{FIT_MARGIN, ROAD_WIDTH, TRACK_SUBDIVISIONS};

/// Control points of the closed loop, all on the ground plane.
pub const TRACK_CONTROL_POINTS: [Vec3; 9] = [
    Vec3::new(0.0, 0.1, -80.0),
    Vec3::new(50.0, 0.1, -80.0),
    Vec3::new(80.0, 0.1, -50.0),
    Vec3::new(80.0, 0.1, 50.0),
    Vec3::new(50.0, 0.1, 80.0),
    Vec3::new(-50.0, 0.1, 80.0),
    Vec3::new(-80.0, 0.1, 50.0),
    Vec3::new(-80.0, 0.1, -50.0),
    Vec3::new(-50.0, 0.1, -80.0),
];

/// The control points could not form a closed loop; without one there is
/// nothing to drive on, so startup fails with this.
#[derive(Debug)]
pub struct TrackBuildError(InsufficientDataError);

impl fmt::Display for TrackBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to build the track loop: {}", self.0)
    }
}

impl std::error::Error for TrackBuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl From<InsufficientDataError> for TrackBuildError {
    fn from(err: InsufficientDataError) -> Self {
        Self(err)
    }
}

/// The closed racing loop: a cyclic Catmull-Rom curve through the control
/// points, sampled once into a dense polyline. The same polyline feeds the
/// road mesh and the minimap outline, and the bounding extent sizes both.
/// Nothing here mutates after construction.
#[derive(Resource)]
pub struct Track {
    curve: CubicCurve<Vec3>,
    polyline: Vec<Vec3>,
    min: Vec3,
    max: Vec3,
}

impl Track {
    /// Build the loop from the fixed control points.
    pub fn build() -> Result<Self, TrackBuildError> {
        Self::from_control_points(&TRACK_CONTROL_POINTS)
    }

    /// Build a loop through arbitrary control points. Fails when there are
    /// too few points to close a spline.
    pub fn from_control_points(points: &[Vec3]) -> Result<Self, TrackBuildError> {
        let curve = CubicCardinalSpline::new_catmull_rom(points.to_vec()).to_curve_cyclic()?;
        let polyline: Vec<Vec3> = curve.iter_positions(TRACK_SUBDIVISIONS).collect();

        let mut min = Vec3::MAX;
        let mut max = Vec3::MIN;
        for point in &polyline {
            min = min.min(*point);
            max = max.max(*point);
        }

        Ok(Self {
            curve,
            polyline,
            min,
            max,
        })
    }

    /// Sampled points around the loop; the last sample equals the first.
    pub fn polyline(&self) -> &[Vec3] {
        &self.polyline
    }

    /// Width and depth of the loop's bounding box.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Where the car starts: the first sample of the loop.
    pub fn start_position(&self) -> Vec3 {
        self.polyline[0]
    }

    /// Yaw aligned with the curve tangent at the start.
    pub fn start_yaw(&self) -> f32 {
        let tangent = self.curve.velocity(0.0);
        tangent.x.atan2(tangent.z)
    }

    /// Point at normalized position `t` in [0, 1) around the loop.
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.curve.position(t * self.curve.segments().len() as f32)
    }

    /// Tangent direction at normalized position `t`.
    pub fn tangent_at(&self, t: f32) -> Vec3 {
        self.curve
            .velocity(t * self.curve.segments().len() as f32)
            .normalize()
    }
}

/// Build the track and spawn the static scenery around it: ground plane,
/// road ribbon and the center-line dashes. A loop that cannot be built
/// aborts startup instead of silently leaving an empty scene.
pub fn setup_track(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) -> Result {
    let track = Track::build()?;

    info!(
        "track loop sampled: {} points, extent {:.0} x {:.0}",
        track.polyline().len(),
        track.size().x,
        track.size().z
    );

    // Grass plane covering the same square the road-fit margin leaves around
    // the loop
    let ground_size = track.size().max_element() / FIT_MARGIN;
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(ground_size, ground_size))),
        MeshMaterial3d(materials.add(Color::srgb_u8(0x90, 0xee, 0x90))),
    ));

    commands.spawn((
        Mesh3d(meshes.add(road_mesh(track.polyline(), ROAD_WIDTH))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb_u8(0x44, 0x44, 0x44),
            cull_mode: None,
            double_sided: true,
            ..default()
        })),
    ));

    // One dash per percent of the loop, laid along the local tangent
    let dash_mesh = meshes.add(Cuboid::new(0.2, 0.02, 2.5));
    let dash_material = materials.add(Color::WHITE);
    for i in 0..100 {
        let t = i as f32 / 100.0;
        let point = track.point_at(t);
        let tangent = track.tangent_at(t);
        let dash_yaw = tangent.x.atan2(tangent.z);
        commands.spawn((
            Mesh3d(dash_mesh.clone()),
            MeshMaterial3d(dash_material.clone()),
            Transform::from_xyz(point.x, 0.02, point.z)
                .with_rotation(Quat::from_rotation_y(dash_yaw)),
        ));
    }

    commands.insert_resource(track);
    Ok(())
}

/// Sweep a flat ribbon along the closed polyline: two vertices per sample,
/// offset sideways from the center line and stitched into quads. Sits just
/// above the ground plane.
fn road_mesh(polyline: &[Vec3], width: f32) -> Mesh {
    let half = width / 2.0;
    let mut positions = Vec::with_capacity(polyline.len() * 2);
    let mut indices = Vec::with_capacity((polyline.len() - 1) * 6);

    for (i, point) in polyline.iter().enumerate() {
        // Central-difference tangent; the polyline is closed (first == last),
        // so wrap one sample past the seam on both sides
        let prev = polyline[if i == 0 { polyline.len() - 2 } else { i - 1 }];
        let next = polyline[if i + 1 == polyline.len() { 1 } else { i + 1 }];
        let tangent = (next - prev).normalize_or_zero();
        let side = Vec3::new(-tangent.z, 0.0, tangent.x) * half;

        positions.push([point.x + side.x, 0.01, point.z + side.z]);
        positions.push([point.x - side.x, 0.01, point.z - side.z]);
    }

    for i in 0..polyline.len() - 1 {
        let a = (i * 2) as u32;
        indices.extend_from_slice(&[a, a + 2, a + 1, a + 1, a + 2, a + 3]);
    }

    let normals = vec![[0.0, 1.0, 0.0]; positions.len()];

    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
        .with_inserted_indices(Indices::U32(indices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_polyline_is_closed_and_dense() {
        let track = Track::build().unwrap();
        let polyline = track.polyline();

        assert_eq!(polyline.len(), TRACK_SUBDIVISIONS + 1);
        assert!((polyline[0] - polyline[polyline.len() - 1]).length() < 1e-3);
    }

    #[test]
    fn test_extent_is_centered_on_origin() {
        let track = Track::build().unwrap();

        let center = (track.min + track.max) / 2.0;
        assert!(center.x.abs() < 1.0);
        assert!(center.z.abs() < 1.0);

        // The loop spans the control-point square, allowing a little spline
        // overshoot between points
        let size = track.size();
        assert!(size.x >= 160.0 && size.x < 175.0);
        assert!(size.z >= 160.0 && size.z < 175.0);
        assert!(size.y.abs() < 1e-3);
    }

    #[test]
    fn test_start_pose_matches_first_control_point() {
        let track = Track::build().unwrap();

        assert!((track.start_position() - TRACK_CONTROL_POINTS[0]).length() < 1e-3);
        // The first segment runs toward +X, so the start yaw is a quarter
        // turn left of +Z
        assert!((track.start_yaw() - FRAC_PI_2).abs() < 1e-3);
    }

    #[test]
    fn test_too_few_control_points_fail() {
        let result = Track::from_control_points(&[Vec3::ZERO]);
        assert!(result.is_err());
    }

    #[test]
    fn test_road_mesh_covers_every_sample() {
        let track = Track::build().unwrap();
        let mesh = road_mesh(track.polyline(), ROAD_WIDTH);

        assert_eq!(mesh.count_vertices(), track.polyline().len() * 2);
        let indices = mesh.indices().expect("road mesh is indexed");
        assert_eq!(indices.len(), (track.polyline().len() - 1) * 6);
    }

    #[test]
    fn test_road_mesh_straddles_center_line() {
        let track = Track::build().unwrap();
        let mesh = road_mesh(track.polyline(), ROAD_WIDTH);

        let Some(bevy::render::mesh::VertexAttributeValues::Float32x3(positions)) =
            mesh.attribute(Mesh::ATTRIBUTE_POSITION)
        else {
            panic!("road mesh has positions");
        };

        // Edge vertices sit half the road width to either side of the sample
        let center = track.polyline()[0];
        let left = Vec3::from(positions[0]);
        let right = Vec3::from(positions[1]);
        let midpoint = (left + right) / 2.0;

        assert!((midpoint.x - center.x).abs() < 1e-3);
        assert!((midpoint.z - center.z).abs() < 1e-3);
        assert!((left.distance(right) - ROAD_WIDTH).abs() < 1e-3);
    }
}
