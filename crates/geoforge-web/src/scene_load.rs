//! Scene-instance loading
//!
//! Loading is idempotent per scene id: a load for a scene already loaded or
//! already in flight is a no-op. On every (re)load the previously tracked
//! entities are cleared and the new set is created wholesale; instances are
//! resolved sequentially in list order inside one task. A bad instance is
//! skipped and counted, never aborting the batch.

use bevy::prelude::*;
use std::sync::{Arc, Mutex};

use geoforge_core::{find_material, AssetRef, SceneInstance};
use geoforge_scene::materials::{apply_material_recursive, MaterialLibrary};
use geoforge_scene::models::ModelCache;
use geoforge_scene::types::{instance_local_transform, PlacedInstance, SceneLoadTracker, SceneOrigin};

use crate::app::Notifications;
use crate::network::{ApiConfig, PendingNotices, StorageBase};

pub struct SceneLoadPlugin;

impl Plugin for SceneLoadPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SceneInstances>()
            .init_resource::<PendingInstanceBatch>()
            .add_systems(
                Update,
                (
                    process_instance_batch,
                    attach_loaded_models,
                    apply_instance_materials,
                    report_model_failures,
                ),
            );
    }
}

/// Tracked entities for the currently loaded scene
#[derive(Resource, Default)]
pub struct SceneInstances {
    pub tracker: SceneLoadTracker,
    pub entities: Vec<Entity>,
}

impl SceneInstances {
    /// Remove every tracked entity and forget the loaded scene
    pub fn clear(&mut self, commands: &mut Commands) {
        for entity in self.entities.drain(..) {
            commands.entity(entity).despawn();
        }
        self.tracker.reset();
    }
}

/// How a resolved instance gets rendered
#[derive(Debug, Clone)]
pub enum SpawnSource {
    /// Stream a glTF/GLB from a signed URL
    Gltf { url: String },
    /// Tileset root; loaded as glTF when the root content is one
    TilesetRoot { url: Option<String> },
    /// Placeholder point + label at the computed position
    SplatPoint,
}

#[derive(Debug, Clone)]
pub struct InstanceSpawn {
    pub instance: SceneInstance,
    pub source: SpawnSource,
}

/// Resolved batch handed from the fetch task to the spawn system
pub struct InstanceBatch {
    pub scene_id: String,
    pub spawns: Vec<InstanceSpawn>,
    pub failed: usize,
    /// The instance list itself could not be fetched
    pub fetch_failed: bool,
}

#[derive(Resource, Default, Clone)]
pub struct PendingInstanceBatch(pub Arc<Mutex<Option<InstanceBatch>>>);

/// Component marking an entity still waiting for its model to stream in
#[derive(Component)]
pub struct PendingModelScene {
    pub url: String,
}

/// Component marking an entity whose per-instance material is not applied yet
#[derive(Component)]
pub struct PendingInstanceMaterial {
    pub shader_key: &'static str,
}

/// Marker for the Gaussian-splat placeholder
#[derive(Component)]
pub struct SplatPlaceholder {
    pub label: String,
}

/// Kick off loading for a scene. No-op when that scene is already loaded or
/// a load is in progress.
pub fn load_scene_instances(
    scene_id: &str,
    config: &ApiConfig,
    storage: &StorageBase,
    pending: &PendingInstanceBatch,
    instances: &mut SceneInstances,
    notices: &PendingNotices,
) {
    if !instances.tracker.begin(scene_id) {
        tracing::debug!("Scene {} already loaded or loading, skipping", scene_id);
        return;
    }

    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen_futures::spawn_local;

        use crate::network::{http, model_download_url, public_model_download_url};

        let base = config.base_url.clone();
        let storage_base = storage.0.clone();
        let scene_id = scene_id.to_string();
        let pending_clone = pending.0.clone();
        let notices = notices.clone();

        spawn_local(async move {
            let list_url = format!("{base}/scenes/{scene_id}/instances");
            tracing::info!("Loading scene instances from: {}", list_url);

            let raw = match http::get_json::<Vec<geoforge_core::SceneInstanceJson>>(&list_url).await
            {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::error!("Failed to list scene instances: {}", e);
                    notices.error(format!("Could not load scene instances: {e}"));
                    if let Ok(mut data) = pending_clone.lock() {
                        *data = Some(InstanceBatch {
                            scene_id,
                            spawns: Vec::new(),
                            failed: 0,
                            fetch_failed: true,
                        });
                    }
                    return;
                }
            };

            let plan = geoforge_core::plan_load(raw);
            let mut failed = plan.skipped;
            let mut spawns = Vec::new();

            // Sequential on purpose: instances appear in list order
            for instance in plan.ready {
                let source = match &instance.asset {
                    AssetRef::Model(id) => {
                        match model_download_url(&base, id.as_str(), false).await {
                            Ok(url) => Some(SpawnSource::Gltf { url }),
                            Err(e) => {
                                tracing::warn!("Instance {}: no download URL: {}", instance.id, e);
                                None
                            }
                        }
                    }
                    AssetRef::PublicModel(id) => {
                        match public_model_download_url(&base, id.as_str()).await {
                            Ok(url) => Some(SpawnSource::Gltf { url }),
                            Err(e) => {
                                tracing::warn!("Instance {}: no download URL: {}", instance.id, e);
                                None
                            }
                        }
                    }
                    AssetRef::ThreeDTiles { id, tileset_url } => {
                        let descriptor_url = match tileset_url {
                            Some(url) => Some(url.clone()),
                            None => {
                                match http::get_json::<TilesetDescriptorJson>(&format!(
                                    "{base}/tiles/{}",
                                    id.as_str()
                                ))
                                .await
                                {
                                    Ok(descriptor) => descriptor.tileset_url,
                                    Err(e) => {
                                        tracing::warn!(
                                            "Instance {}: no tileset descriptor: {}",
                                            instance.id,
                                            e
                                        );
                                        None
                                    }
                                }
                            }
                        };
                        match descriptor_url {
                            Some(url) => {
                                let resolved = match &storage_base {
                                    Some(storage) => {
                                        geoforge_scene::models::resolve_asset_url(storage, &url)
                                    }
                                    None => geoforge_scene::models::resolve_asset_url(&base, &url),
                                };
                                Some(SpawnSource::TilesetRoot {
                                    url: Some(resolved),
                                })
                            }
                            None => None,
                        }
                    }
                    AssetRef::GaussianSplat(id) => {
                        match http::get_json::<serde_json::Value>(&format!(
                            "{base}/splats/{}",
                            id.as_str()
                        ))
                        .await
                        {
                            Ok(_) => Some(SpawnSource::SplatPoint),
                            Err(e) => {
                                tracing::warn!(
                                    "Instance {}: no splat descriptor: {}",
                                    instance.id,
                                    e
                                );
                                None
                            }
                        }
                    }
                };

                match source {
                    Some(source) => spawns.push(InstanceSpawn { instance, source }),
                    None => failed += 1,
                }
            }

            if let Ok(mut data) = pending_clone.lock() {
                *data = Some(InstanceBatch {
                    scene_id,
                    spawns,
                    failed,
                    fetch_failed: false,
                });
            }
        });
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (config, storage, pending, notices);
        tracing::warn!("Scene loading not available in native mode");
        instances.tracker.reset();
    }
}

/// Tileset descriptor payload
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TilesetDescriptorJson {
    #[serde(default)]
    pub tileset_url: Option<String>,
}

/// First material id on an instance, resolved to a palette shader key
fn instance_shader_key(instance: &SceneInstance) -> Option<&'static str> {
    instance
        .materials
        .first()
        .and_then(|id| find_material(id))
        .map(|m| m.shader_key)
}

/// Drain the resolved batch: clear the old entity set, spawn the new one
fn process_instance_batch(
    mut commands: Commands,
    pending: Res<PendingInstanceBatch>,
    mut instances: ResMut<SceneInstances>,
    origin: Res<SceneOrigin>,
    mut cache: ResMut<ModelCache>,
    asset_server: Res<AssetServer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut notifications: ResMut<Notifications>,
) {
    let batch = {
        match pending.0.lock() {
            Ok(mut data) => data.take(),
            Err(_) => None,
        }
    };
    let Some(batch) = batch else {
        return;
    };

    if batch.fetch_failed {
        instances.tracker.reset();
        return;
    }

    // Clear all previously tracked entities before adding the new set
    for entity in instances.entities.drain(..) {
        commands.entity(entity).despawn();
    }

    let attempted = batch.spawns.len() + batch.failed;

    for spawn in batch.spawns {
        let transform = instance_local_transform(&origin, &spawn.instance.transform);
        let placed = PlacedInstance {
            instance_id: spawn.instance.id.clone(),
            asset: spawn.instance.asset.clone(),
        };
        let shader_key = instance_shader_key(&spawn.instance);

        let entity = match spawn.source {
            SpawnSource::Gltf { url } => {
                cache.request(&asset_server, &url);
                let mut entity = commands.spawn((
                    transform,
                    Visibility::default(),
                    placed,
                    PendingModelScene { url },
                ));
                if let Some(shader_key) = shader_key {
                    entity.insert(PendingInstanceMaterial { shader_key });
                }
                entity.id()
            }
            SpawnSource::TilesetRoot { url } => match url {
                Some(url) if url.ends_with(".glb") || url.ends_with(".gltf") => {
                    cache.request(&asset_server, &url);
                    commands
                        .spawn((
                            transform,
                            Visibility::default(),
                            placed,
                            PendingModelScene { url },
                        ))
                        .id()
                }
                _ => {
                    // Bounds placeholder until tiles stream in
                    commands
                        .spawn((
                            Mesh3d(meshes.add(Cuboid::new(30.0, 30.0, 30.0))),
                            MeshMaterial3d(materials.add(StandardMaterial {
                                base_color: Color::srgba(0.4, 0.6, 0.9, 0.25),
                                alpha_mode: bevy::render::alpha::AlphaMode::Blend,
                                unlit: true,
                                ..default()
                            })),
                            transform,
                            placed,
                        ))
                        .id()
                }
            },
            SpawnSource::SplatPoint => commands
                .spawn((
                    Mesh3d(meshes.add(Sphere::new(2.0))),
                    MeshMaterial3d(materials.add(StandardMaterial {
                        base_color: Color::srgb(0.9, 0.7, 0.2),
                        emissive: bevy::color::LinearRgba::new(0.9, 0.7, 0.2, 1.0),
                        unlit: true,
                        ..default()
                    })),
                    transform,
                    placed,
                    SplatPlaceholder {
                        label: spawn.instance.name.clone(),
                    },
                ))
                .id(),
        };

        instances.entities.push(entity);
    }

    instances.tracker.finish(&batch.scene_id);

    let loaded = instances.entities.len();
    if batch.failed > 0 {
        notifications.error(format!(
            "Loaded {loaded} of {attempted} instances ({} skipped)",
            batch.failed
        ));
    } else {
        notifications.info(format!("Loaded {loaded} instances"));
    }
}

/// Attach streamed-in glTF scenes to their waiting entities
fn attach_loaded_models(
    mut commands: Commands,
    cache: Res<ModelCache>,
    waiting: Query<(Entity, &PendingModelScene)>,
) {
    for (entity, pending) in waiting.iter() {
        if let Some(scene) = cache.scene_for(&pending.url) {
            commands
                .entity(entity)
                .insert(SceneRoot(scene))
                .remove::<PendingModelScene>();
        } else if cache.is_failed(&pending.url) {
            // Reported via the cache failure drain; the entity stays as an
            // empty anchor so the instance keeps its slot in the set
            commands.entity(entity).remove::<PendingModelScene>();
        }
    }
}

/// Apply per-instance materials once the glTF subtree exists
fn apply_instance_materials(
    mut commands: Commands,
    library: Res<MaterialLibrary>,
    waiting: Query<(Entity, &PendingInstanceMaterial, Option<&Children>)>,
    children_query: Query<&Children>,
    mesh_query: Query<Entity, With<Mesh3d>>,
) {
    for (entity, pending, children) in waiting.iter() {
        if children.is_none() {
            continue;
        }
        if let Some(handle) = library.handle(pending.shader_key) {
            apply_material_recursive(&mut commands, entity, &children_query, &mesh_query, &handle);
        }
        commands.entity(entity).remove::<PendingInstanceMaterial>();
    }
}

/// Surface engine load failures as notifications
fn report_model_failures(mut cache: ResMut<ModelCache>, mut notifications: ResMut<Notifications>) {
    for url in cache.take_failures() {
        notifications.error(format!("Model failed to load: {url}"));
    }
}
