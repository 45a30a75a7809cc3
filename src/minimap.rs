use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::camera::{ClearColorConfig, Viewport};
use bevy::render::mesh::Indices;
use bevy::render::render_resource::PrimitiveTopology;
use bevy::render::view::RenderLayers;
use bevy::window::{PrimaryWindow, WindowResized};

use crate::car::PlayerControlled;
use crate::constants::{
    FIT_MARGIN, MINIMAP_LINE_WIDTH, MINIMAP_MARKER_RADIUS, MINIMAP_PADDING, MINIMAP_SIZE,
};
use crate::track::Track;

// The minimap renders on its own layer so neither camera sees the
// other's world
const MINIMAP_LAYER: usize = 1;

#[derive(Component)]
pub struct MinimapCamera;

#[derive(Component)]
pub struct MinimapMarker;

/// Uniform world-to-panel mapping, fixed once the track is known. Panel
/// coordinates put the origin at the top-left corner with y growing
/// downward.
#[derive(Resource)]
pub struct MinimapProjection {
    scale: f32,
}

impl MinimapProjection {
    pub fn new(track: &Track) -> Self {
        let size = track.size();
        let scale = (MINIMAP_SIZE / size.x).min(MINIMAP_SIZE / size.z) * FIT_MARGIN;
        Self { scale }
    }

    /// Map a world position onto the panel.
    pub fn project(&self, world: Vec3) -> Vec2 {
        Vec2::new(world.x, world.z) * self.scale + Vec2::splat(MINIMAP_SIZE / 2.0)
    }

    /// The same mapping in the overlay camera's frame: origin at the panel
    /// center, y growing upward.
    pub fn to_overlay(&self, world: Vec3) -> Vec2 {
        let panel = self.project(world);
        Vec2::new(panel.x - MINIMAP_SIZE / 2.0, MINIMAP_SIZE / 2.0 - panel.y)
    }
}

/// Spawn the overlay camera and the retained panel entities: backdrop,
/// loop outline and the car marker, stacked in that order.
pub fn setup_minimap(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    track: Res<Track>,
    window: Single<&Window, With<PrimaryWindow>>,
) {
    let projection = MinimapProjection::new(&track);

    commands.spawn((
        Camera2d,
        Camera {
            order: 1,
            clear_color: ClearColorConfig::None,
            viewport: Some(minimap_viewport(&window)),
            ..default()
        },
        MinimapCamera,
        RenderLayers::layer(MINIMAP_LAYER),
    ));

    commands.spawn((
        Sprite {
            color: Color::srgba(0.0, 0.0, 0.0, 0.4),
            custom_size: Some(Vec2::splat(MINIMAP_SIZE)),
            ..default()
        },
        Transform::from_xyz(0.0, 0.0, 0.0),
        RenderLayers::layer(MINIMAP_LAYER),
    ));

    let outline: Vec<Vec2> = track
        .polyline()
        .iter()
        .map(|point| projection.to_overlay(*point))
        .collect();
    commands.spawn((
        Mesh2d(meshes.add(outline_mesh(&outline, MINIMAP_LINE_WIDTH))),
        MeshMaterial2d(materials.add(Color::srgb_u8(0x88, 0x88, 0x88))),
        Transform::from_xyz(0.0, 0.0, 1.0),
        RenderLayers::layer(MINIMAP_LAYER),
    ));

    let start = projection.to_overlay(track.start_position());
    commands.spawn((
        Mesh2d(meshes.add(Circle::new(MINIMAP_MARKER_RADIUS))),
        MeshMaterial2d(materials.add(Color::srgb_u8(0xff, 0x00, 0x00))),
        Transform::from_xyz(start.x, start.y, 2.0),
        MinimapMarker,
        RenderLayers::layer(MINIMAP_LAYER),
    ));

    commands.insert_resource(projection);
}

/// Keep the viewport glued to the bottom-right corner across resizes.
pub fn set_minimap_viewport(
    windows: Query<&Window>,
    mut resize_events: EventReader<WindowResized>,
    camera: Single<&mut Camera, With<MinimapCamera>>,
) {
    let mut camera = camera.into_inner();
    for event in resize_events.read() {
        if let Ok(window) = windows.get(event.window) {
            camera.viewport = Some(minimap_viewport(window));
        }
    }
}

/// Move the marker to the car's projected position every frame.
pub fn update_minimap_marker(
    projection: Res<MinimapProjection>,
    player_car: Single<&Transform, (With<PlayerControlled>, Without<MinimapMarker>)>,
    marker: Single<&mut Transform, (With<MinimapMarker>, Without<PlayerControlled>)>,
) {
    let mut marker_transform = marker.into_inner();
    let position = projection.to_overlay(player_car.translation);
    marker_transform.translation.x = position.x;
    marker_transform.translation.y = position.y;
}

/// A square viewport in the window's bottom-right corner, shrunk when the
/// window itself is smaller than the panel.
fn minimap_viewport(window: &Window) -> Viewport {
    let scale = window.scale_factor();
    let size = ((MINIMAP_SIZE * scale) as u32)
        .min(window.physical_width())
        .min(window.physical_height())
        .max(1);
    let pad = (MINIMAP_PADDING * scale) as u32;

    Viewport {
        physical_position: UVec2::new(
            window.physical_width().saturating_sub(size + pad),
            window.physical_height().saturating_sub(size + pad),
        ),
        physical_size: UVec2::splat(size),
        ..default()
    }
}

/// Stitch the projected loop into a constant-width triangle strip. The
/// outline is closed (first point equals last), so tangents wrap across
/// the seam.
fn outline_mesh(points: &[Vec2], width: f32) -> Mesh {
    let half = width / 2.0;
    let mut positions = Vec::with_capacity(points.len() * 2);
    let mut uvs = Vec::with_capacity(points.len() * 2);
    let mut indices = Vec::with_capacity((points.len() - 1) * 6);

    for (i, point) in points.iter().enumerate() {
        let prev = points[if i == 0 { points.len() - 2 } else { i - 1 }];
        let next = points[if i + 1 == points.len() { 1 } else { i + 1 }];
        let tangent = (next - prev).normalize_or_zero();
        let side = Vec2::new(-tangent.y, tangent.x) * half;

        positions.push([point.x + side.x, point.y + side.y, 0.0]);
        positions.push([point.x - side.x, point.y - side.y, 0.0]);
        let along = i as f32 / (points.len() - 1) as f32;
        uvs.push([along, 0.0]);
        uvs.push([along, 1.0]);
    }

    for i in 0..points.len() - 1 {
        let a = (i * 2) as u32;
        indices.extend_from_slice(&[a, a + 1, a + 2, a + 2, a + 1, a + 3]);
    }

    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
        .with_inserted_indices(Indices::U32(indices))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_track() -> Track {
        Track::build().unwrap()
    }

    #[test]
    fn test_loop_projects_inside_the_panel() {
        let track = test_track();
        let projection = MinimapProjection::new(&track);

        for point in track.polyline() {
            let panel = projection.project(*point);
            assert!(panel.x > 0.0 && panel.x < MINIMAP_SIZE);
            assert!(panel.y > 0.0 && panel.y < MINIMAP_SIZE);
        }
    }

    #[test]
    fn test_loop_spans_the_margin_width() {
        let track = test_track();
        let projection = MinimapProjection::new(&track);

        let mut min = Vec2::MAX;
        let mut max = Vec2::MIN;
        for point in track.polyline() {
            let panel = projection.project(*point);
            min = min.min(panel);
            max = max.max(panel);
        }

        let span = (max - min).max_element();
        assert!((span - MINIMAP_SIZE * FIT_MARGIN).abs() < 1.0);
    }

    #[test]
    fn test_world_origin_maps_to_panel_center() {
        let track = test_track();
        let projection = MinimapProjection::new(&track);

        let center = projection.project(Vec3::ZERO);
        assert!((center - Vec2::splat(MINIMAP_SIZE / 2.0)).length() < 1e-4);
    }

    #[test]
    fn test_marker_moves_while_track_points_stay_fixed() {
        let track = test_track();
        let projection = MinimapProjection::new(&track);

        let landmark = track.polyline()[42];
        let before = projection.project(landmark);

        let car_early = projection.project(Vec3::new(0.0, 0.1, -80.0));
        let car_later = projection.project(Vec3::new(12.0, 0.1, -76.0));

        // The static outline never re-maps; only the car marker does
        assert_eq!(before, projection.project(landmark));
        assert_ne!(car_early, car_later);
    }

    #[test]
    fn test_overlay_frame_flips_vertically() {
        let track = test_track();
        let projection = MinimapProjection::new(&track);

        // +Z in the world is downward on the panel, so the overlay camera
        // sees it below center
        let overlay = projection.to_overlay(Vec3::new(0.0, 0.0, 10.0));
        assert!(overlay.x.abs() < 1e-4);
        assert!(overlay.y < 0.0);
    }

    #[test]
    fn test_viewport_hugs_the_bottom_right_corner() {
        let mut window = Window::default();
        window.resolution.set_physical_resolution(1280, 720);

        let viewport = minimap_viewport(&window);
        assert_eq!(viewport.physical_size, UVec2::splat(200));
        assert_eq!(
            viewport.physical_position,
            UVec2::new(1280 - 200 - 16, 720 - 200 - 16)
        );
    }

    #[test]
    fn test_viewport_fits_tiny_windows() {
        let mut window = Window::default();
        window.resolution.set_physical_resolution(120, 90);

        let viewport = minimap_viewport(&window);
        assert!(viewport.physical_position.x + viewport.physical_size.x <= 120);
        assert!(viewport.physical_position.y + viewport.physical_size.y <= 90);
    }

    #[test]
    fn test_outline_mesh_covers_every_sample() {
        let track = test_track();
        let projection = MinimapProjection::new(&track);
        let outline: Vec<Vec2> = track
            .polyline()
            .iter()
            .map(|point| projection.to_overlay(*point))
            .collect();

        let mesh = outline_mesh(&outline, MINIMAP_LINE_WIDTH);
        assert_eq!(mesh.count_vertices(), outline.len() * 2);
        let indices = mesh.indices().expect("outline mesh is indexed");
        assert_eq!(indices.len(), (outline.len() - 1) * 6);
    }
}
