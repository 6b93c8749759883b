//! Preview model loading from URL query parameters, and preview-image
//! capture once the model is on screen

use bevy::prelude::*;
use std::sync::{Arc, Mutex};

use geoforge_scene::models::ModelCache;
use geoforge_scene::CameraSettings;

use crate::app::{PreviewRequest, PreviewState};

pub struct PreviewLoaderPlugin;

impl Plugin for PreviewLoaderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PendingPreview>()
            .init_resource::<CaptureCountdown>()
            .add_systems(Startup, read_url_parameters)
            .add_systems(
                Update,
                (process_resolved_url, attach_preview_model, run_capture_timer),
            );
    }
}

/// Pending async results from URL resolution
#[derive(Resource, Default)]
pub struct PendingPreview {
    pub url: Arc<Mutex<Option<String>>>,
    pub name: Arc<Mutex<Option<String>>>,
    pub error: Arc<Mutex<Option<String>>>,
}

/// Marker for the single previewed model entity
#[derive(Component)]
pub struct PreviewModel;

/// Entity waiting for its glTF to stream in
#[derive(Component)]
pub struct PreviewModelPending {
    pub url: String,
}

/// Short delay after display so a frame completes before capture
#[derive(Resource, Default)]
pub struct CaptureCountdown {
    pub timer: Option<Timer>,
}

/// Read `model`, `isPublicModel`, `hasPreviewImage`, and `api` from the URL
fn read_url_parameters(
    mut request: ResMut<PreviewRequest>,
    mut state: ResMut<PreviewState>,
    pending: Res<PendingPreview>,
) {
    #[cfg(target_arch = "wasm32")]
    {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Ok(href) = window.location().href() else {
            return;
        };
        let Ok(url) = web_sys::Url::new(&href) else {
            return;
        };
        let params = url.search_params();

        request.model_id = params.get("model");
        request.is_public_model = params.get("isPublicModel").as_deref() == Some("true");
        request.has_preview_image = params.get("hasPreviewImage").as_deref() == Some("true");
        request.api_base = params.get("api").unwrap_or_else(|| {
            let location = window.location();
            let host = location.host().unwrap_or_else(|_| "localhost:8080".to_string());
            let is_https = location.protocol().unwrap_or_default() == "https:";
            format!("{}://{}", if is_https { "https" } else { "http" }, host)
        });

        let Some(model_id) = request.model_id.clone() else {
            state.error = Some("No model requested".to_string());
            return;
        };

        tracing::info!(
            "Preview request: model={} public={} has_preview={}",
            model_id,
            request.is_public_model,
            request.has_preview_image
        );
        state.loading = true;
        state.model_name = model_id.clone();

        let api_base = request.api_base.clone();
        let is_public = request.is_public_model;
        let url_out = pending.url.clone();
        let name_out = pending.name.clone();
        let error_out = pending.error.clone();

        wasm_bindgen_futures::spawn_local(async move {
            let resolved = if is_public {
                // Detail first for the display name, then the counted download
                if let Ok(detail) =
                    fetch_json("GET", &format!("{api_base}/public-models/{model_id}")).await
                {
                    if let Some(filename) = detail.get("filename").and_then(|v| v.as_str()) {
                        *name_out.lock().unwrap() = Some(filename.to_string());
                    }
                }
                fetch_json(
                    "POST",
                    &format!("{api_base}/public-models/{model_id}/download"),
                )
                .await
            } else {
                fetch_json("GET", &format!("{api_base}/files/download/{model_id}")).await
            };

            match resolved {
                Ok(body) => match body.get("url").and_then(|v| v.as_str()) {
                    Some(url) => *url_out.lock().unwrap() = Some(url.to_string()),
                    None => {
                        *error_out.lock().unwrap() =
                            Some("Download response had no URL".to_string())
                    }
                },
                Err(e) => *error_out.lock().unwrap() = Some(e),
            }
        });
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (pending, state);
        request.api_base = String::new();
    }
}

/// Fetch JSON from the backend
#[cfg(target_arch = "wasm32")]
async fn fetch_json(method: &str, url: &str) -> Result<serde_json::Value, String> {
    use wasm_bindgen::JsCast;

    let window = web_sys::window().ok_or("No window")?;

    let init = web_sys::RequestInit::new();
    init.set_method(method);
    let request = web_sys::Request::new_with_str_and_init(url, &init)
        .map_err(|e| format!("Bad request: {e:?}"))?;

    let resp = wasm_bindgen_futures::JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| format!("Fetch failed: {e:?}"))?;

    let resp: web_sys::Response = resp.dyn_into().map_err(|_| "Response cast failed")?;

    if !resp.ok() {
        return Err(format!("HTTP {}: {}", resp.status(), resp.status_text()));
    }

    let text = wasm_bindgen_futures::JsFuture::from(resp.text().map_err(|_| "Failed to get text")?)
        .await
        .map_err(|e| format!("Text extraction failed: {e:?}"))?;

    let text = text.as_string().ok_or("Not a string")?;
    serde_json::from_str(&text).map_err(|e| format!("JSON parse error: {e}"))
}

/// PUT a multipart form to the backend
#[cfg(target_arch = "wasm32")]
async fn put_form(url: &str, form: &web_sys::FormData) -> Result<(), String> {
    use wasm_bindgen::JsCast;

    let window = web_sys::window().ok_or("No window")?;

    let init = web_sys::RequestInit::new();
    init.set_method("PUT");
    init.set_body(form.as_ref());
    let request = web_sys::Request::new_with_str_and_init(url, &init)
        .map_err(|e| format!("Bad request: {e:?}"))?;

    let resp = wasm_bindgen_futures::JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| format!("Fetch failed: {e:?}"))?;
    let resp: web_sys::Response = resp.dyn_into().map_err(|_| "Response cast failed")?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }
    Ok(())
}

/// Hand the resolved URL to the model cache and spawn the anchor entity
fn process_resolved_url(
    mut commands: Commands,
    pending: Res<PendingPreview>,
    mut state: ResMut<PreviewState>,
    mut cache: ResMut<ModelCache>,
    asset_server: Res<AssetServer>,
    mut camera: ResMut<CameraSettings>,
) {
    if let Ok(mut name) = pending.name.try_lock() {
        if let Some(name) = name.take() {
            state.model_name = name;
        }
    }

    if let Ok(mut error) = pending.error.try_lock() {
        if let Some(e) = error.take() {
            state.loading = false;
            state.error = Some(e);
        }
    }

    if let Ok(mut url) = pending.url.try_lock() {
        if let Some(url) = url.take() {
            tracing::info!("Preview model URL resolved");
            cache.request(&asset_server, &url);
            commands.spawn((
                Transform::IDENTITY,
                Visibility::default(),
                PreviewModel,
                PreviewModelPending { url: url.clone() },
            ));
            state.model_url = Some(url);
            camera.fly_to(Vec3::ZERO, 40.0);
        }
    }
}

/// Attach the streamed glTF and arm the capture timer
fn attach_preview_model(
    mut commands: Commands,
    mut cache: ResMut<ModelCache>,
    request: Res<PreviewRequest>,
    mut state: ResMut<PreviewState>,
    mut countdown: ResMut<CaptureCountdown>,
    waiting: Query<(Entity, &PreviewModelPending)>,
) {
    for (entity, pending) in waiting.iter() {
        if let Some(scene) = cache.scene_for(&pending.url) {
            commands
                .entity(entity)
                .insert(SceneRoot(scene))
                .remove::<PreviewModelPending>();
            state.loading = false;
            state.displayed = true;

            // Give the renderer a beat before reading the canvas back
            if !request.has_preview_image && !state.captured {
                countdown.timer = Some(Timer::from_seconds(1.5, TimerMode::Once));
            }
        } else if cache.is_failed(&pending.url) {
            commands.entity(entity).remove::<PreviewModelPending>();
            state.loading = false;
            state.error = Some("Model failed to load".to_string());
        }
    }
    for url in cache.take_failures() {
        tracing::error!("Preview model failed: {}", url);
    }
}

/// Capture the canvas and upload it as the asset's preview image
fn run_capture_timer(
    time: Res<Time>,
    mut countdown: ResMut<CaptureCountdown>,
    request: Res<PreviewRequest>,
    mut state: ResMut<PreviewState>,
) {
    let Some(ref mut timer) = countdown.timer else {
        return;
    };
    timer.tick(time.delta());
    if !timer.just_finished() {
        return;
    }
    countdown.timer = None;
    state.captured = true;

    #[cfg(target_arch = "wasm32")]
    {
        use base64::Engine;
        use wasm_bindgen::JsCast;

        let Some(model_id) = request.model_id.clone() else {
            return;
        };
        let api_base = request.api_base.clone();
        let is_public = request.is_public_model;

        let Some(canvas) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("geoforge-preview-canvas"))
            .and_then(|e| e.dyn_into::<web_sys::HtmlCanvasElement>().ok())
        else {
            tracing::error!("Preview canvas not found for capture");
            return;
        };

        let Ok(data_url) = canvas.to_data_url_with_type("image/png") else {
            tracing::error!("Canvas capture failed");
            return;
        };
        let Some(encoded) = data_url.split(',').nth(1) else {
            return;
        };
        let Ok(bytes) = base64::engine::general_purpose::STANDARD.decode(encoded) else {
            tracing::error!("Canvas data URL decode failed");
            return;
        };

        tracing::info!("Captured preview image ({} bytes)", bytes.len());

        wasm_bindgen_futures::spawn_local(async move {
            let result = async {
                let form = web_sys::FormData::new().map_err(|e| format!("form: {e:?}"))?;
                let array = js_sys::Uint8Array::from(bytes.as_slice());
                let parts = js_sys::Array::new();
                parts.push(&array.buffer());
                let blob = web_sys::Blob::new_with_u8_array_sequence(&parts)
                    .map_err(|e| format!("blob: {e:?}"))?;
                form.append_with_blob_and_filename("image", &blob, "preview.png")
                    .map_err(|e| format!("form append: {e:?}"))?;

                let url = if is_public {
                    format!("{api_base}/public-models/{model_id}/preview-image")
                } else {
                    format!("{api_base}/files/{model_id}/preview-image")
                };
                put_form(&url, &form).await
            }
            .await;

            match result {
                Ok(()) => tracing::info!("Preview image uploaded"),
                Err(e) => tracing::error!("Preview image upload failed: {}", e),
            }
        });
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = request;
    }
}
