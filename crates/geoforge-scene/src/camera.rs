//! Orbit camera controls and fly-to

use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;

use crate::types::SceneOrigin;

/// Marker component for the main camera
#[derive(Component)]
pub struct MainCamera;

/// Camera controller settings
#[derive(Debug, Clone, Resource)]
pub struct CameraSettings {
    pub distance: f32,
    pub target_distance: f32, // For smooth zoom
    pub azimuth: f32,
    pub elevation: f32,
    pub target: Vec3,
    pub target_focus: Vec3, // For smooth re-centering
    pub sensitivity: f32,
    pub zoom_speed: f32,
    pub smooth_factor: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            distance: 600.0,
            target_distance: 600.0,
            azimuth: 0.8,   // Start rotated ~45 degrees
            elevation: 0.6, // Slightly elevated view
            target: Vec3::ZERO,
            target_focus: Vec3::ZERO,
            sensitivity: 0.005,
            zoom_speed: 0.1,
            smooth_factor: 0.15,
        }
    }
}

impl CameraSettings {
    /// Re-center on a local point and pull back to an overview distance
    pub fn fly_to(&mut self, focus: Vec3, distance: f32) {
        self.target_focus = focus;
        self.target_distance = distance.clamp(10.0, 50_000.0);
    }
}

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CameraSettings>()
            .add_systems(Update, (fly_on_origin_change, update_camera));
    }
}

/// Re-fly the camera whenever the configured origin changes
fn fly_on_origin_change(origin: Res<SceneOrigin>, mut settings: ResMut<CameraSettings>) {
    if origin.is_changed() {
        settings.fly_to(Vec3::ZERO, 600.0);
    }
}

fn update_camera(
    mut camera_query: Query<&mut Transform, With<MainCamera>>,
    mut settings: ResMut<CameraSettings>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut mouse_wheel: MessageReader<MouseWheel>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    time: Res<Time>,
    mut contexts: bevy_egui::EguiContexts,
) {
    // Don't fight the UI for the pointer
    let egui_wants_pointer = contexts
        .ctx_mut()
        .map(|ctx| ctx.wants_pointer_input())
        .unwrap_or(false);

    let mut total_motion = Vec2::ZERO;
    for motion in mouse_motion.read() {
        total_motion += motion.delta;
    }

    // Orbit with left mouse drag
    if mouse_button.pressed(MouseButton::Left) && !egui_wants_pointer {
        settings.azimuth -= total_motion.x * settings.sensitivity;
        settings.elevation =
            (settings.elevation - total_motion.y * settings.sensitivity).clamp(0.05, 1.5);
    }

    // Pan on the ground plane with right mouse drag (ENU: X-Y plane)
    if mouse_button.pressed(MouseButton::Right) && !egui_wants_pointer {
        let right = Vec3::new(-settings.azimuth.sin(), settings.azimuth.cos(), 0.0);
        let forward = Vec3::new(settings.azimuth.cos(), settings.azimuth.sin(), 0.0);
        let pan_speed = settings.distance * 0.002;
        settings.target_focus -= right * total_motion.x * pan_speed;
        settings.target_focus += forward * total_motion.y * pan_speed;
    }

    // Zoom with scroll, smoothed through target_distance
    if !egui_wants_pointer {
        for scroll in mouse_wheel.read() {
            let zoom_factor = 1.0 - scroll.y * settings.zoom_speed * 0.3;
            settings.target_distance =
                (settings.target_distance * zoom_factor).clamp(10.0, 50_000.0);
        }
    } else {
        for _ in mouse_wheel.read() {}
    }

    // Smooth interpolation for zoom and target
    let dt = time.delta_secs();
    let lerp_factor = 1.0 - (-settings.smooth_factor * 60.0 * dt).exp();
    settings.distance =
        settings.distance + (settings.target_distance - settings.distance) * lerp_factor;
    settings.target = settings.target + (settings.target_focus - settings.target) * lerp_factor;

    // Spherical coordinates with Z-up
    if let Ok(mut transform) = camera_query.single_mut() {
        let x = settings.distance * settings.azimuth.cos() * settings.elevation.cos();
        let y = settings.distance * settings.azimuth.sin() * settings.elevation.cos();
        let z = settings.distance * settings.elevation.sin();

        transform.translation = settings.target + Vec3::new(x, y, z);
        transform.look_at(settings.target, Vec3::Z);
    }
}
