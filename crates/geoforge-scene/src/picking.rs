//! Pointer projection onto the globe surface and instance picking

use bevy::prelude::*;
use geoforge_core::geo::{geodetic_at, Enu, Geodetic};

use crate::types::SceneOrigin;

/// Intersect a ray with the local ground plane (z = 0).
/// Returns None when the ray misses (parallel or pointing away).
pub fn ray_ground_intersection(origin: Vec3, direction: Vec3) -> Option<Vec3> {
    if direction.z.abs() < 1e-6 {
        return None;
    }
    let t = -origin.z / direction.z;
    if t <= 0.0 {
        return None;
    }
    Some(origin + direction * t)
}

/// Project a viewport cursor position onto the ground plane
pub fn cursor_to_ground(
    camera: &Camera,
    camera_transform: &GlobalTransform,
    cursor: Vec2,
) -> Option<Vec3> {
    let ray = camera.viewport_to_world(camera_transform, cursor).ok()?;
    ray_ground_intersection(ray.origin, *ray.direction)
}

/// Geodetic coordinate of a local ground point
pub fn local_to_geodetic(origin: &SceneOrigin, local: Vec3) -> Geodetic {
    geodetic_at(
        origin.0,
        Enu::new(local.x as f64, local.y as f64, local.z as f64),
    )
}

/// Closest candidate whose bounding sphere the ray passes through.
/// Candidates are (id, world position, hit radius).
pub fn closest_hit<T: Copy>(
    ray_origin: Vec3,
    ray_direction: Vec3,
    candidates: impl Iterator<Item = (T, Vec3, f32)>,
) -> Option<T> {
    let mut closest: Option<(f32, T)> = None;
    for (id, position, radius) in candidates {
        let to_candidate = position - ray_origin;
        let t = to_candidate.dot(ray_direction);
        if t < 0.0 {
            continue;
        }
        let closest_point = ray_origin + ray_direction * t;
        let distance_sq = (closest_point - position).length_squared();
        if distance_sq < radius * radius {
            if closest.is_none() || t < closest.as_ref().unwrap().0 {
                closest = Some((t, id));
            }
        }
    }
    closest.map(|(_, id)| id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downward_ray_hits_ground() {
        let hit = ray_ground_intersection(Vec3::new(5.0, 3.0, 10.0), Vec3::new(0.0, 0.0, -1.0))
            .unwrap();
        assert_eq!(hit, Vec3::new(5.0, 3.0, 0.0));
    }

    #[test]
    fn test_parallel_and_upward_rays_miss() {
        assert!(ray_ground_intersection(Vec3::new(0.0, 0.0, 10.0), Vec3::X).is_none());
        assert!(ray_ground_intersection(Vec3::new(0.0, 0.0, 10.0), Vec3::Z).is_none());
    }

    #[test]
    fn test_closest_hit_prefers_nearer_candidate() {
        let candidates = [
            (1usize, Vec3::new(0.0, 0.0, -20.0), 2.0),
            (2usize, Vec3::new(0.0, 0.0, -10.0), 2.0),
            (3usize, Vec3::new(50.0, 0.0, -10.0), 2.0),
        ];
        let hit = closest_hit(Vec3::ZERO, Vec3::NEG_Z, candidates.into_iter());
        assert_eq!(hit, Some(2));
    }

    #[test]
    fn test_closest_hit_rejects_behind_camera() {
        let candidates = [(1usize, Vec3::new(0.0, 0.0, 10.0), 2.0)];
        assert_eq!(
            closest_hit(Vec3::ZERO, Vec3::NEG_Z, candidates.into_iter()),
            None
        );
    }

    #[test]
    fn test_ground_point_maps_to_origin_coordinate() {
        let origin = SceneOrigin::default();
        let geo = local_to_geodetic(&origin, Vec3::ZERO);
        let eps = 1e-6;
        assert!((geo.lon_deg() - origin.0.lon_deg()).abs() < eps);
        assert!((geo.lat_deg() - origin.0.lat_deg()).abs() < eps);
    }
}
