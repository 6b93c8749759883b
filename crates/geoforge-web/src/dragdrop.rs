//! Drag-and-drop placement controller
//!
//! One gesture at a time: Idle until a drag enters the viewer, Dragging
//! while the pointer coordinate is continuously projected onto the globe
//! (a missed ray clears the readout), Resolving once on drop, then back to
//! Idle whether or not resolution succeeded. Failures surface as
//! notifications and never propagate to the caller.
//!
//! Payloads arrive two ways: native DOM drag events on the canvas (string
//! pairs on the data transfer) and in-app drags started from the library
//! panel. Both feed the same state machine.

use bevy::prelude::*;
use std::sync::{Arc, Mutex};

use geoforge_core::{
    find_material, AssetId, AssetRef, ConversionStatus, DragPayload, Enu, Geodetic,
    InstanceTransform, Placement, SceneInstance,
};
use geoforge_scene::materials::{apply_material_recursive, MaterialLibrary};
use geoforge_scene::models::ModelCache;
use geoforge_scene::picking::{closest_hit, cursor_to_ground, local_to_geodetic};
use geoforge_scene::types::{instance_local_transform, PlacedInstance, SceneOrigin};
use geoforge_scene::MainCamera;

use crate::app::{ActiveScene, ModelLibrary, Notifications, PublicCatalog};
use crate::network::{update_scene_property, ApiConfig, PendingNotices};
use crate::scene_load::{PendingModelScene, SceneInstances};

/// Hit radius for assigning a material to the entity under the drop point
const MATERIAL_PICK_RADIUS: f32 = 25.0;

pub struct DragDropPlugin;

impl Plugin for DragDropPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DragState>()
            .init_resource::<PendingDragEvents>()
            .init_resource::<DropQueue>()
            .init_resource::<PendingPlacements>()
            .add_message::<ModelPlaced>()
            .add_systems(Startup, setup_dom_drag_listeners)
            .add_systems(
                Update,
                (
                    process_dom_drag_events,
                    track_in_app_drag,
                    resolve_drops,
                    process_placements,
                )
                    .chain(),
            );
    }
}

/// Current drag gesture state
#[derive(Resource, Default)]
pub struct DragState {
    /// Payload of an in-app drag, set by the library panel
    pub payload: Option<DragPayload>,
    /// The single live coordinate shown during a drag
    pub hover: Option<Geodetic>,
    /// Whether a DOM drag is currently over the canvas
    dom_drag_active: bool,
}

impl DragState {
    /// Begin an in-app drag from a library row
    pub fn begin(&mut self, payload: DragPayload) {
        self.payload = Some(payload);
    }

    pub fn is_dragging(&self) -> bool {
        self.payload.is_some() || self.dom_drag_active
    }
}

/// Raw drag events pushed from the DOM callbacks
pub enum DragDomEvent {
    Over { x: f32, y: f32 },
    Drop { x: f32, y: f32, entries: Vec<(String, String)> },
    Leave,
}

#[derive(Resource, Default, Clone)]
pub struct PendingDragEvents(pub Arc<Mutex<Vec<DragDomEvent>>>);

/// Drops awaiting resolution, with the viewport position if known
#[derive(Resource, Default)]
pub struct DropQueue(pub Vec<(DragPayload, Option<Vec2>)>);

/// A placement whose download URL resolved, ready to enter the viewer
pub struct PlacementDrop {
    pub instance: SceneInstance,
    pub url: String,
}

#[derive(Resource, Default, Clone)]
pub struct PendingPlacements(pub Arc<Mutex<Vec<PlacementDrop>>>);

/// Raised after a model lands in the scene, for layer-state refreshes
#[derive(Message)]
pub struct ModelPlaced {
    pub name: String,
}

/// Register dragover/drop/dragleave listeners on the canvas
fn setup_dom_drag_listeners(pending: Res<PendingDragEvents>) {
    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen::prelude::*;
        use wasm_bindgen::JsCast;

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            tracing::error!("setup_dom_drag_listeners: no document");
            return;
        };
        let Some(canvas) = document.get_element_by_id("geoforge-canvas") else {
            tracing::error!("setup_dom_drag_listeners: canvas not found");
            return;
        };

        let queue = pending.0.clone();
        let on_dragover = Closure::wrap(Box::new(move |event: web_sys::DragEvent| {
            // Required for the element to accept drops at all
            event.prevent_default();
            if let Ok(mut events) = queue.lock() {
                events.push(DragDomEvent::Over {
                    x: event.offset_x() as f32,
                    y: event.offset_y() as f32,
                });
            }
        }) as Box<dyn FnMut(web_sys::DragEvent)>);
        canvas
            .add_event_listener_with_callback("dragover", on_dragover.as_ref().unchecked_ref())
            .ok();
        on_dragover.forget();

        let queue = pending.0.clone();
        let on_drop = Closure::wrap(Box::new(move |event: web_sys::DragEvent| {
            event.prevent_default();
            let mut entries = Vec::new();
            if let Some(transfer) = event.data_transfer() {
                for key in [
                    geoforge_core::drag::MODEL_KEY,
                    geoforge_core::drag::PUBLIC_MODEL_KEY,
                    geoforge_core::drag::MATERIAL_KEY,
                ] {
                    if let Ok(value) = transfer.get_data(key) {
                        if !value.is_empty() {
                            entries.push((key.to_string(), value));
                        }
                    }
                }
            }
            if let Ok(mut events) = queue.lock() {
                events.push(DragDomEvent::Drop {
                    x: event.offset_x() as f32,
                    y: event.offset_y() as f32,
                    entries,
                });
            }
        }) as Box<dyn FnMut(web_sys::DragEvent)>);
        canvas
            .add_event_listener_with_callback("drop", on_drop.as_ref().unchecked_ref())
            .ok();
        on_drop.forget();

        let queue = pending.0.clone();
        let on_dragleave = Closure::wrap(Box::new(move |_event: web_sys::DragEvent| {
            if let Ok(mut events) = queue.lock() {
                events.push(DragDomEvent::Leave);
            }
        }) as Box<dyn FnMut(web_sys::DragEvent)>);
        canvas
            .add_event_listener_with_callback("dragleave", on_dragleave.as_ref().unchecked_ref())
            .ok();
        on_dragleave.forget();
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = pending;
    }
}

/// Drain DOM drag events into the state machine
fn process_dom_drag_events(
    pending: Res<PendingDragEvents>,
    mut drag_state: ResMut<DragState>,
    mut drop_queue: ResMut<DropQueue>,
    origin: Res<SceneOrigin>,
    camera_query: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
) {
    let events = {
        match pending.0.lock() {
            Ok(mut queue) => std::mem::take(&mut *queue),
            Err(_) => Vec::new(),
        }
    };

    for event in events {
        match event {
            DragDomEvent::Over { x, y } => {
                drag_state.dom_drag_active = true;
                drag_state.hover = project_to_geodetic(&camera_query, &origin, Vec2::new(x, y));
            }
            DragDomEvent::Drop { x, y, entries } => {
                drag_state.dom_drag_active = false;
                let pairs: Vec<(&str, &str)> = entries
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect();
                if let Some(payload) = DragPayload::from_entries(pairs) {
                    drop_queue.0.push((payload, Some(Vec2::new(x, y))));
                } else {
                    tracing::debug!("Drop without a recognized payload, ignoring");
                    drag_state.hover = None;
                }
            }
            DragDomEvent::Leave => {
                drag_state.dom_drag_active = false;
                drag_state.hover = None;
            }
        }
    }
}

/// Track an in-app drag started from the library panel
fn track_in_app_drag(
    mut drag_state: ResMut<DragState>,
    mut drop_queue: ResMut<DropQueue>,
    origin: Res<SceneOrigin>,
    windows: Query<&Window>,
    camera_query: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    mouse_button: Res<ButtonInput<MouseButton>>,
) {
    if drag_state.payload.is_none() {
        return;
    }

    let cursor = windows.single().ok().and_then(|w| w.cursor_position());

    // Live coordinate while the pointer moves; cleared when the ray misses
    drag_state.hover = cursor.and_then(|pos| project_to_geodetic(&camera_query, &origin, pos));

    if mouse_button.just_released(MouseButton::Left) {
        if let Some(payload) = drag_state.payload.take() {
            drop_queue.0.push((payload, cursor));
        }
    }
}

fn project_to_geodetic(
    camera_query: &Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    origin: &SceneOrigin,
    viewport_pos: Vec2,
) -> Option<Geodetic> {
    let (camera, camera_transform) = camera_query.single().ok()?;
    let local = cursor_to_ground(camera, camera_transform, viewport_pos)?;
    Some(local_to_geodetic(origin, local))
}

/// Resolve queued drops: assign materials, or place models
fn resolve_drops(
    mut commands: Commands,
    mut drop_queue: ResMut<DropQueue>,
    mut drag_state: ResMut<DragState>,
    library: Res<ModelLibrary>,
    catalog: Res<PublicCatalog>,
    config: Res<ApiConfig>,
    notices: Res<PendingNotices>,
    pending_placements: Res<PendingPlacements>,
    mut notifications: ResMut<Notifications>,
    material_library: Res<MaterialLibrary>,
    camera_query: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    placed_query: Query<(Entity, &PlacedInstance, &GlobalTransform)>,
    children_query: Query<&Children>,
    mesh_query: Query<Entity, With<Mesh3d>>,
) {
    if drop_queue.0.is_empty() {
        return;
    }

    for (payload, viewport_pos) in drop_queue.0.drain(..) {
        // The readout is cleared the moment resolution begins
        drag_state.hover = None;
        drag_state.payload = None;

        let ray = viewport_pos.and_then(|pos| {
            let (camera, camera_transform) = camera_query.single().ok()?;
            camera.viewport_to_world(camera_transform, pos).ok()
        });
        let ground_local = ray.and_then(|r| {
            geoforge_scene::picking::ray_ground_intersection(r.origin, *r.direction)
        });

        match payload {
            DragPayload::Material(material_id) => {
                let Some(definition) = find_material(&material_id) else {
                    notifications.error(format!("Unknown material: {material_id}"));
                    continue;
                };
                let Some(ray) = ray else {
                    // Nothing under the pointer, nothing to paint
                    continue;
                };
                let hit = closest_hit(
                    ray.origin,
                    *ray.direction,
                    placed_query
                        .iter()
                        .map(|(entity, _, transform)| {
                            (entity, transform.translation(), MATERIAL_PICK_RADIUS)
                        }),
                );
                let Some(entity) = hit else {
                    continue;
                };
                let Ok((_, placed, _)) = placed_query.get(entity) else {
                    continue;
                };
                // Only model primitives take materials
                if matches!(
                    placed.asset,
                    AssetRef::Model(_) | AssetRef::PublicModel(_)
                ) {
                    if let Some(handle) = material_library.handle(definition.shader_key) {
                        apply_material_recursive(
                            &mut commands,
                            entity,
                            &children_query,
                            &mesh_query,
                            &handle,
                        );
                        notifications.info(format!(
                            "Applied {} to {}",
                            definition.name, placed.instance_id
                        ));
                    }
                }
            }
            DragPayload::Model(model_id) => {
                // Resolved against the in-memory list, never refetched
                let Some(asset) = library.find(&model_id) else {
                    notifications.error(format!("Model {model_id} is not in the current list"));
                    continue;
                };
                let converted = asset
                    .conversion
                    .as_ref()
                    .map(|c| c.status == ConversionStatus::Completed)
                    .unwrap_or(false);
                let instance = new_instance(
                    asset.name.clone(),
                    AssetRef::Model(asset.id.clone()),
                    ground_local,
                );
                request_model_placement(
                    &config,
                    instance,
                    converted,
                    false,
                    &pending_placements,
                    &notices,
                );
            }
            DragPayload::PublicModel(model_id) => {
                let Some(model) = catalog.find(&model_id) else {
                    notifications.error(format!(
                        "Public model {model_id} is not in the current list"
                    ));
                    continue;
                };
                let instance = new_instance(
                    model.filename.clone(),
                    AssetRef::PublicModel(AssetId::new(&model.id)),
                    ground_local,
                );
                request_model_placement(
                    &config,
                    instance,
                    false,
                    true,
                    &pending_placements,
                    &notices,
                );
            }
        }
    }
}

/// Build a fresh instance at the drop point, or at the scene origin when
/// ray-casting missed
fn new_instance(name: String, asset: AssetRef, ground_local: Option<Vec3>) -> SceneInstance {
    let location = ground_local
        .map(|p| [p.x as f64, p.y as f64, p.z as f64])
        .unwrap_or([0.0, 0.0, 0.0]);
    SceneInstance {
        id: AssetId::temporary().to_string(),
        name,
        transform: InstanceTransform {
            location,
            ..Default::default()
        },
        materials: Vec::new(),
        asset,
    }
}

/// Fetch the signed download URL, then queue the placement
fn request_model_placement(
    config: &ApiConfig,
    instance: SceneInstance,
    converted: bool,
    is_public: bool,
    pending: &PendingPlacements,
    notices: &PendingNotices,
) {
    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen_futures::spawn_local;

        use crate::network::{model_download_url, public_model_download_url};

        let base = config.base_url.clone();
        let pending_clone = pending.0.clone();
        let notices = notices.clone();

        spawn_local(async move {
            let id = instance.asset.asset_id().as_str().to_string();
            let url = if is_public {
                public_model_download_url(&base, &id).await
            } else {
                model_download_url(&base, &id, converted).await
            };
            match url {
                Ok(url) => {
                    if let Ok(mut queue) = pending_clone.lock() {
                        queue.push(PlacementDrop { instance, url });
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to resolve download URL: {}", e);
                    notices.error(format!("Could not place {}: {e}", instance.name));
                }
            }
        });
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (config, instance, converted, is_public, pending, notices);
    }
}

/// Add resolved placements to the viewer and persist them to the scene
fn process_placements(
    mut commands: Commands,
    pending: Res<PendingPlacements>,
    mut instances: ResMut<SceneInstances>,
    origin: Res<SceneOrigin>,
    mut cache: ResMut<ModelCache>,
    asset_server: Res<AssetServer>,
    active_scene: Res<ActiveScene>,
    config: Res<ApiConfig>,
    notices: Res<PendingNotices>,
    mut notifications: ResMut<Notifications>,
    mut placed_messages: MessageWriter<ModelPlaced>,
) {
    let placements = {
        match pending.0.lock() {
            Ok(mut queue) => std::mem::take(&mut *queue),
            Err(_) => Vec::new(),
        }
    };

    for placement in placements {
        let transform = instance_local_transform(&origin, &placement.instance.transform);
        cache.request(&asset_server, &placement.url);

        let entity = commands
            .spawn((
                transform,
                Visibility::default(),
                PlacedInstance {
                    instance_id: placement.instance.id.clone(),
                    asset: placement.instance.asset.clone(),
                },
                PendingModelScene {
                    url: placement.url.clone(),
                },
            ))
            .id();
        instances.entities.push(entity);

        // Persist the composed placement so other viewers can anchor it
        // without redoing the math
        if let Some(ref scene_id) = active_scene.id {
            let t = &placement.instance.transform;
            let anchor = Placement::compose(
                origin.0,
                Enu::new(t.location[0], t.location[1], t.location[2]),
                t.rotation,
                t.scale,
            );
            let asset_type = match placement.instance.asset {
                AssetRef::Model(_) => "model",
                AssetRef::PublicModel(_) => "public_model",
                AssetRef::ThreeDTiles { .. } => "threeDTiles",
                AssetRef::GaussianSplat(_) => "gaussianSplat",
            };
            update_scene_property(
                &config,
                scene_id,
                "instances.append",
                serde_json::json!({
                    "id": placement.instance.id,
                    "name": placement.instance.name,
                    "location": t.location,
                    "rotation": t.rotation,
                    "scale": t.scale,
                    "assetId": placement.instance.asset.asset_id().as_str(),
                    "assetType": asset_type,
                    "anchor": {
                        "x": anchor.position.x,
                        "y": anchor.position.y,
                        "z": anchor.position.z,
                    },
                }),
                &notices,
            );
        }

        notifications.info(format!("Placed {}", placement.instance.name));
        placed_messages.write(ModelPlaced {
            name: placement.instance.name.clone(),
        });
    }
}
