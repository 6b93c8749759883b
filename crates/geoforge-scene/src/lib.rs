//! GeoForge Scene - Shared 3D viewer systems
//!
//! This crate provides the viewer functionality used by both the editor
//! application (geoforge-web) and the standalone model preview
//! (geoforge-viewer): orbit camera with fly-to, ground grid and lighting
//! around the scene origin, glTF model cache, globe ray projection, and the
//! built-in material palette.

pub mod camera;
pub mod materials;
pub mod models;
pub mod picking;
pub mod terrain;
pub mod types;

use bevy::prelude::*;

/// Plugin that sets up the shared viewer components
pub struct GeoForgeScenePlugin;

impl Plugin for GeoForgeScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<types::SceneOrigin>()
            .add_plugins(camera::CameraPlugin)
            .add_plugins(terrain::TerrainPlugin)
            .add_plugins(models::ModelsPlugin)
            .add_plugins(materials::MaterialsPlugin);
    }
}

pub use camera::{CameraSettings, MainCamera};
pub use types::*;
