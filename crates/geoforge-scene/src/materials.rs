//! Engine materials for the built-in palette

use bevy::prelude::*;
use bevy::render::alpha::AlphaMode;
use geoforge_core::BUILTIN_MATERIALS;
use std::collections::HashMap;

pub struct MaterialsPlugin;

impl Plugin for MaterialsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MaterialLibrary>()
            .add_systems(Startup, setup_material_library);
    }
}

/// Engine material handles keyed by the palette's opaque shader key
#[derive(Resource, Default)]
pub struct MaterialLibrary {
    handles: HashMap<&'static str, Handle<StandardMaterial>>,
}

impl MaterialLibrary {
    pub fn handle(&self, shader_key: &str) -> Option<Handle<StandardMaterial>> {
        self.handles.get(shader_key).cloned()
    }
}

fn setup_material_library(
    mut library: ResMut<MaterialLibrary>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for definition in BUILTIN_MATERIALS {
        let handle = materials.add(material_for_key(definition.shader_key));
        library.handles.insert(definition.shader_key, handle);
    }
}

/// Resolve an opaque shader key into an engine material
fn material_for_key(key: &str) -> StandardMaterial {
    match key {
        "concrete_rough" => StandardMaterial {
            base_color: Color::srgb(0.62, 0.6, 0.58),
            perceptual_roughness: 0.95,
            metallic: 0.0,
            ..default()
        },
        "metal_brushed" => StandardMaterial {
            base_color: Color::srgb(0.7, 0.72, 0.75),
            perceptual_roughness: 0.35,
            metallic: 0.9,
            ..default()
        },
        "glass_tinted" => StandardMaterial {
            base_color: Color::srgba(0.4, 0.55, 0.65, 0.45),
            perceptual_roughness: 0.1,
            metallic: 0.0,
            alpha_mode: AlphaMode::Blend,
            ..default()
        },
        "foliage_flat" => StandardMaterial {
            base_color: Color::srgb(0.25, 0.5, 0.22),
            perceptual_roughness: 0.85,
            metallic: 0.0,
            ..default()
        },
        "water_calm" => StandardMaterial {
            base_color: Color::srgba(0.15, 0.35, 0.5, 0.7),
            perceptual_roughness: 0.08,
            metallic: 0.0,
            alpha_mode: AlphaMode::Blend,
            ..default()
        },
        _ => StandardMaterial {
            base_color: Color::srgb(0.5, 0.5, 0.5),
            ..default()
        },
    }
}

/// Reassign the material on every mesh in an instance subtree
pub fn apply_material_recursive(
    commands: &mut Commands,
    root: Entity,
    children_query: &Query<&Children>,
    mesh_query: &Query<Entity, With<Mesh3d>>,
    material: &Handle<StandardMaterial>,
) {
    if mesh_query.get(root).is_ok() {
        commands
            .entity(root)
            .insert(MeshMaterial3d(material.clone()));
    }
    if let Ok(children) = children_query.get(root) {
        for child in children.iter() {
            apply_material_recursive(commands, child, children_query, mesh_query, material);
        }
    }
}
