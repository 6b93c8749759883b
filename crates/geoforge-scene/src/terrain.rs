//! Ground plane, lighting, and local frame axes around the scene origin

use bevy::prelude::*;
use bevy::render::alpha::AlphaMode;

/// Marker for ground grid lines
#[derive(Component)]
pub struct GridLine;

/// Marker for the east/north/up axis lines at the origin
#[derive(Component)]
pub struct WorldAxis;

/// Viewer environment toggles
#[derive(Debug, Clone, Resource)]
pub struct ViewerSettings {
    pub show_grid: bool,
    pub show_axis: bool,
    pub grid_spacing: f32,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            show_grid: true,
            show_axis: true,
            grid_spacing: 50.0, // 50m cells
        }
    }
}

pub struct TerrainPlugin;

impl Plugin for TerrainPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ViewerSettings>()
            .add_systems(Startup, setup_environment)
            .add_systems(Update, update_environment_visibility);
    }
}

fn setup_environment(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    settings: Res<ViewerSettings>,
) {
    // ENU frame: X=East, Y=North, Z=Up
    commands.spawn((
        Camera3d { ..default() },
        Projection::Perspective(PerspectiveProjection {
            near: 0.1,
            far: 200_000.0,
            ..default()
        }),
        Transform::from_xyz(400.0, -400.0, 350.0).looking_at(Vec3::ZERO, Vec3::Z),
        crate::camera::MainCamera,
    ));

    commands.insert_resource(AmbientLight {
        color: Color::srgb(0.9, 0.95, 1.0),
        brightness: 250.0,
        ..default()
    });

    // Sun
    commands.spawn((
        DirectionalLight {
            illuminance: 8_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(1_000.0, 800.0, 2_000.0).looking_at(Vec3::ZERO, Vec3::Z),
    ));

    // Warm fill from the opposite quadrant
    commands.spawn((
        PointLight {
            intensity: 500_000.0,
            range: 5_000.0,
            shadows_enabled: false,
            color: Color::srgb(1.0, 0.95, 0.9),
            ..default()
        },
        Transform::from_xyz(-800.0, -800.0, 1_200.0),
    ));

    spawn_grid(&mut commands, &mut meshes, &mut materials, &settings);
    spawn_axes(&mut commands, &mut meshes, &mut materials);
}

fn spawn_grid(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
    settings: &ViewerSettings,
) {
    let grid_size = 20;
    let spacing = settings.grid_spacing;
    let extent = grid_size as f32 * spacing;
    let thickness = 0.4;

    let initial_visibility = if settings.show_grid {
        Visibility::Visible
    } else {
        Visibility::Hidden
    };

    let line_material = materials.add(StandardMaterial {
        base_color: Color::srgba(0.4, 0.4, 0.4, 0.5),
        unlit: true,
        alpha_mode: AlphaMode::Blend,
        ..default()
    });

    // Lines along X (East)
    let line_mesh_x = meshes.add(Cuboid::new(extent * 2.0, thickness, thickness));
    // Lines along Y (North)
    let line_mesh_y = meshes.add(Cuboid::new(thickness, extent * 2.0, thickness));

    for i in -grid_size..=grid_size {
        let y = i as f32 * spacing;
        commands.spawn((
            Mesh3d(line_mesh_x.clone()),
            MeshMaterial3d(line_material.clone()),
            Transform::from_translation(Vec3::new(0.0, y, 0.0)),
            GridLine,
            initial_visibility,
        ));
    }

    for i in -grid_size..=grid_size {
        let x = i as f32 * spacing;
        commands.spawn((
            Mesh3d(line_mesh_y.clone()),
            MeshMaterial3d(line_material.clone()),
            Transform::from_translation(Vec3::new(x, 0.0, 0.0)),
            GridLine,
            initial_visibility,
        ));
    }
}

fn spawn_axes(
    commands: &mut Commands,
    meshes: &mut ResMut<Assets<Mesh>>,
    materials: &mut ResMut<Assets<StandardMaterial>>,
) {
    let axis_length = 120.0;
    let axis_thickness = 1.2;
    let cone_height = axis_thickness * 4.0;
    let cone_radius = axis_thickness * 2.5;

    let axes = [
        // East (red): cylinder is Y-aligned, rotate -90 around Z
        (
            Color::srgb(0.9, 0.2, 0.2),
            Vec3::X,
            Quat::from_rotation_z(-std::f32::consts::FRAC_PI_2),
        ),
        // North (green): no rotation needed
        (Color::srgb(0.2, 0.9, 0.2), Vec3::Y, Quat::IDENTITY),
        // Up (blue): rotate +90 around X
        (
            Color::srgb(0.2, 0.2, 0.9),
            Vec3::Z,
            Quat::from_rotation_x(std::f32::consts::FRAC_PI_2),
        ),
    ];

    for (color, dir, rotation) in axes {
        let material = materials.add(StandardMaterial {
            base_color: color,
            unlit: true,
            ..default()
        });
        commands.spawn((
            Mesh3d(meshes.add(Cylinder::new(axis_thickness, axis_length))),
            MeshMaterial3d(material.clone()),
            Transform::from_translation(dir * axis_length / 2.0 + Vec3::Z * 0.1)
                .with_rotation(rotation),
            WorldAxis,
        ));
        commands.spawn((
            Mesh3d(meshes.add(Cone::new(cone_radius, cone_height))),
            MeshMaterial3d(material),
            Transform::from_translation(dir * (axis_length + cone_height / 2.0) + Vec3::Z * 0.1)
                .with_rotation(rotation),
            WorldAxis,
        ));
    }
}

/// Toggle grid and axis visibility from settings
fn update_environment_visibility(
    settings: Res<ViewerSettings>,
    mut grid_query: Query<&mut Visibility, (With<GridLine>, Without<WorldAxis>)>,
    mut axis_query: Query<&mut Visibility, With<WorldAxis>>,
) {
    if !settings.is_changed() {
        return;
    }

    let grid_visibility = if settings.show_grid {
        Visibility::Visible
    } else {
        Visibility::Hidden
    };
    for mut visibility in grid_query.iter_mut() {
        *visibility = grid_visibility;
    }

    let axis_visibility = if settings.show_axis {
        Visibility::Visible
    } else {
        Visibility::Hidden
    };
    for mut visibility in axis_query.iter_mut() {
        *visibility = axis_visibility;
    }
}
