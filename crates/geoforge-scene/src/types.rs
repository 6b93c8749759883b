//! Shared viewer state types

use bevy::prelude::*;
use geoforge_core::{AssetRef, Geodetic, InstanceTransform};

/// Default view location when no scene is selected (Guangzhou)
pub const DEFAULT_LON: f64 = 113.2644;
pub const DEFAULT_LAT: f64 = 23.1291;
pub const DEFAULT_HEIGHT: f64 = 10_000.0;

/// The scene's geographic reference coordinate
///
/// The viewer renders in the local east/north/up frame of this origin:
/// X=East, Y=North, Z=Up, meters.
#[derive(Debug, Clone, Copy, Resource)]
pub struct SceneOrigin(pub Geodetic);

impl Default for SceneOrigin {
    fn default() -> Self {
        Self(Geodetic::from_degrees(DEFAULT_LON, DEFAULT_LAT, DEFAULT_HEIGHT))
    }
}

impl SceneOrigin {
    /// Local position for an instance offset
    pub fn local_position(&self, transform: &InstanceTransform) -> Vec3 {
        Vec3::new(
            transform.location[0] as f32,
            transform.location[1] as f32,
            transform.location[2] as f32,
        )
    }
}

/// Marker component for a placed scene entity
#[derive(Component)]
pub struct PlacedInstance {
    pub instance_id: String,
    pub asset: AssetRef,
}

/// Idempotency guard for scene-instance loading
///
/// A load for a scene already loaded, or already in progress, is refused.
/// There is no queue: a refused load is simply dropped.
#[derive(Debug, Default, Clone)]
pub struct SceneLoadTracker {
    loaded: Option<String>,
    in_progress: bool,
}

impl SceneLoadTracker {
    /// Try to begin loading `scene_id`. Returns false when the load must be
    /// skipped.
    pub fn begin(&mut self, scene_id: &str) -> bool {
        if self.in_progress {
            return false;
        }
        if self.loaded.as_deref() == Some(scene_id) {
            return false;
        }
        self.in_progress = true;
        true
    }

    /// Mark the in-flight load as finished
    pub fn finish(&mut self, scene_id: &str) {
        self.in_progress = false;
        self.loaded = Some(scene_id.to_string());
    }

    /// Forget the loaded scene (e.g., after the user closes it)
    pub fn reset(&mut self) {
        self.in_progress = false;
        self.loaded = None;
    }

    pub fn is_loading(&self) -> bool {
        self.in_progress
    }

    pub fn loaded_scene(&self) -> Option<&str> {
        self.loaded.as_deref()
    }
}

/// Build the local bevy transform for an instance: ENU offset, then
/// heading/pitch/roll (degrees, ZYX), then per-axis scale.
pub fn instance_local_transform(origin: &SceneOrigin, t: &InstanceTransform) -> Transform {
    let rotation = Quat::from_euler(
        EulerRot::ZYX,
        (t.rotation[0] as f32).to_radians(), // heading (Z, up)
        (t.rotation[1] as f32).to_radians(), // pitch (Y)
        (t.rotation[2] as f32).to_radians(), // roll (X)
    );
    Transform::from_translation(origin.local_position(t))
        .with_rotation(rotation)
        .with_scale(Vec3::new(
            t.scale[0] as f32,
            t.scale[1] as f32,
            t.scale[2] as f32,
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_refuses_reload_of_loaded_scene() {
        let mut tracker = SceneLoadTracker::default();
        assert!(tracker.begin("scene-1"));
        tracker.finish("scene-1");
        assert!(!tracker.begin("scene-1"));
        assert_eq!(tracker.loaded_scene(), Some("scene-1"));
    }

    #[test]
    fn test_tracker_refuses_concurrent_load() {
        let mut tracker = SceneLoadTracker::default();
        assert!(tracker.begin("scene-1"));
        assert!(!tracker.begin("scene-2"));
        tracker.finish("scene-1");
        assert!(tracker.begin("scene-2"));
    }

    #[test]
    fn test_tracker_reset_allows_reload() {
        let mut tracker = SceneLoadTracker::default();
        assert!(tracker.begin("scene-1"));
        tracker.finish("scene-1");
        tracker.reset();
        assert!(tracker.begin("scene-1"));
    }

    #[test]
    fn test_instance_transform_applies_rotation_and_scale() {
        let origin = SceneOrigin::default();
        let t = InstanceTransform {
            location: [10.0, 0.0, 0.0],
            rotation: [90.0, 0.0, 0.0],
            scale: [2.0, 2.0, 2.0],
        };
        let plain = instance_local_transform(
            &origin,
            &InstanceTransform {
                location: [10.0, 0.0, 0.0],
                ..Default::default()
            },
        );
        let turned = instance_local_transform(&origin, &t);
        assert_eq!(turned.translation, plain.translation);
        assert_ne!(turned.rotation, plain.rotation);
        assert_ne!(turned.scale, plain.scale);
    }
}
