//! REST client for the backend asset and scene API
//!
//! Every operation maps 1:1 to a backend endpoint. Requests run in
//! `spawn_local` tasks; parsed responses land in `Arc<Mutex<...>>` pending
//! queues that Bevy systems drain on the next frame. There are no retries,
//! no caching, and no request cancellation: a response from a superseded
//! filter state can overwrite a newer one (known limitation, kept from the
//! source behavior).

use bevy::prelude::*;
use std::sync::{Arc, Mutex};

use geoforge_core::{
    CatalogFilter, CategoryIndex, ModelAsset, ModelAssetJson, PublicModelPage, PublicModelUpdate,
    SceneDetail,
};
use geoforge_scene::SceneOrigin;

use crate::app::{
    ActiveScene, CatalogShelf, CategoryState, ModelLibrary, NoticeKind, Notifications,
    PublicCatalog,
};

pub struct NetworkPlugin;

/// Resource storing the backend connection configuration
#[derive(Resource, Clone)]
pub struct ApiConfig {
    /// HTTP(S) base URL for the REST API
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
        }
    }
}

impl ApiConfig {
    /// Create config from URL query parameters or same-origin fallback
    #[cfg(target_arch = "wasm32")]
    pub fn from_browser() -> Self {
        let window = web_sys::window().expect("no window");
        let location = window.location();

        // Check for ?api= query parameter
        if let Ok(search) = location.search() {
            if let Some(api_param) = Self::parse_query_param(&search, "api") {
                tracing::info!("Using API base from URL parameter: {}", api_param);
                return Self {
                    base_url: api_param,
                };
            }
        }

        // Fall back to same-origin
        let host = location
            .host()
            .unwrap_or_else(|_| "localhost:8080".to_string());
        let is_https = location.protocol().unwrap_or_default() == "https:";

        Self {
            base_url: format!("{}://{}", if is_https { "https" } else { "http" }, host),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_browser() -> Self {
        Self::default()
    }

    /// Parse a query parameter from a search string
    fn parse_query_param(search: &str, param: &str) -> Option<String> {
        let search = search.trim_start_matches('?');
        for pair in search.split('&') {
            let mut parts = pair.splitn(2, '=');
            if let (Some(key), Some(value)) = (parts.next(), parts.next()) {
                if key == param {
                    // URL decode the value
                    return Some(value.replace("%3A", ":").replace("%2F", "/"));
                }
            }
        }
        None
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Signed object-storage base URL for display links and relative tilesets
#[derive(Resource, Default, Clone)]
pub struct StorageBase(pub Option<String>);

// ============================================================================
// Pending queues filled by async fetches
// ============================================================================

#[derive(Resource, Default, Clone)]
pub struct PendingModelList(pub Arc<Mutex<Option<Vec<ModelAssetJson>>>>);

#[derive(Resource, Default, Clone)]
pub struct PendingCatalogPage(pub Arc<Mutex<Option<PublicModelPage>>>);

#[derive(Resource, Default, Clone)]
pub struct PendingCategoryIndex(pub Arc<Mutex<Option<CategoryIndex>>>);

#[derive(Resource, Default, Clone)]
pub struct PendingSceneDetail(pub Arc<Mutex<Option<SceneDetail>>>);

#[derive(Resource, Default, Clone)]
pub struct PendingStorageBase(pub Arc<Mutex<Option<String>>>);

/// Notices raised from async tasks, surfaced as toasts next frame
#[derive(Resource, Default, Clone)]
pub struct PendingNotices(pub Arc<Mutex<Vec<(NoticeKind, String)>>>);

impl PendingNotices {
    pub fn error(&self, message: impl Into<String>) {
        if let Ok(mut queue) = self.0.lock() {
            queue.push((NoticeKind::Error, message.into()));
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        if let Ok(mut queue) = self.0.lock() {
            queue.push((NoticeKind::Info, message.into()));
        }
    }
}

impl Plugin for NetworkPlugin {
    fn build(&self, app: &mut App) {
        let api_config = ApiConfig::from_browser();

        app.insert_resource(api_config)
            .init_resource::<StorageBase>()
            .init_resource::<PendingModelList>()
            .init_resource::<PendingCatalogPage>()
            .init_resource::<PendingCategoryIndex>()
            .init_resource::<PendingSceneDetail>()
            .init_resource::<PendingStorageBase>()
            .init_resource::<PendingNotices>()
            .add_systems(
                Startup,
                (fetch_initial_models, fetch_category_index, fetch_storage_base),
            )
            .add_systems(
                Update,
                (
                    process_model_list,
                    process_catalog_page,
                    process_category_index,
                    process_scene_detail,
                    process_storage_base,
                    process_notices,
                    refetch_catalog_on_filter_change,
                ),
            );
    }
}

// ============================================================================
// Async request helpers (WASM only)
// ============================================================================

#[cfg(target_arch = "wasm32")]
pub(crate) mod http {
    use serde::de::DeserializeOwned;
    use serde::Serialize;

    pub async fn get_json<T: DeserializeOwned>(url: &str) -> Result<T, String> {
        let response = gloo_net::http::Request::get(url)
            .send()
            .await
            .map_err(|e| format!("request failed: {e:?}"))?;
        if !response.ok() {
            return Err(format!("HTTP {}", response.status()));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| format!("bad response body: {e:?}"))
    }

    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        url: &str,
        body: &B,
    ) -> Result<T, String> {
        let response = gloo_net::http::Request::post(url)
            .header("Content-Type", "application/json")
            .body(serde_json::to_string(body).map_err(|e| e.to_string())?)
            .map_err(|e| format!("bad request body: {e:?}"))?
            .send()
            .await
            .map_err(|e| format!("request failed: {e:?}"))?;
        if !response.ok() {
            return Err(format!("HTTP {}", response.status()));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| format!("bad response body: {e:?}"))
    }

    pub async fn post_empty(url: &str) -> Result<(), String> {
        let response = gloo_net::http::Request::post(url)
            .send()
            .await
            .map_err(|e| format!("request failed: {e:?}"))?;
        if !response.ok() {
            return Err(format!("HTTP {}", response.status()));
        }
        Ok(())
    }

    pub async fn put_json<B: Serialize>(url: &str, body: &B) -> Result<(), String> {
        let response = gloo_net::http::Request::put(url)
            .header("Content-Type", "application/json")
            .body(serde_json::to_string(body).map_err(|e| e.to_string())?)
            .map_err(|e| format!("bad request body: {e:?}"))?
            .send()
            .await
            .map_err(|e| format!("request failed: {e:?}"))?;
        if !response.ok() {
            return Err(format!("HTTP {}", response.status()));
        }
        Ok(())
    }

    pub async fn delete(url: &str) -> Result<(), String> {
        let response = gloo_net::http::Request::delete(url)
            .send()
            .await
            .map_err(|e| format!("request failed: {e:?}"))?;
        if !response.ok() {
            return Err(format!("HTTP {}", response.status()));
        }
        Ok(())
    }

    /// POST a multipart form (the browser sets the boundary header)
    pub async fn send_form(
        method: &str,
        url: &str,
        form: web_sys::FormData,
    ) -> Result<(), String> {
        let builder = match method {
            "PUT" => gloo_net::http::Request::put(url),
            _ => gloo_net::http::Request::post(url),
        };
        let response = builder
            .body(form)
            .map_err(|e| format!("bad form body: {e:?}"))?
            .send()
            .await
            .map_err(|e| format!("request failed: {e:?}"))?;
        if !response.ok() {
            return Err(format!("HTTP {}", response.status()));
        }
        Ok(())
    }
}

/// Signed download URL payload
#[derive(Debug, Clone, serde::Deserialize)]
pub struct DownloadUrlJson {
    pub url: String,
}

/// Resolve the signed download URL for a user model.
/// `converted` selects the converted artifact endpoint.
#[cfg(target_arch = "wasm32")]
pub async fn model_download_url(
    base_url: &str,
    id: &str,
    converted: bool,
) -> Result<String, String> {
    let url = if converted {
        format!("{}/files/download/converted/{}", base_url, id)
    } else {
        format!("{}/files/download/{}", base_url, id)
    };
    http::get_json::<DownloadUrlJson>(&url).await.map(|d| d.url)
}

/// Resolve the signed download URL for a public model.
/// Goes through the download endpoint so the backend counts the download.
#[cfg(target_arch = "wasm32")]
pub async fn public_model_download_url(base_url: &str, id: &str) -> Result<String, String> {
    let url = format!("{}/public-models/{}/download", base_url, id);
    http::post_json::<DownloadUrlJson, _>(&url, &serde_json::json!({}))
        .await
        .map(|d| d.url)
}

// ============================================================================
// List fetches
// ============================================================================

/// Fetch the user's model list, replacing the held list wholesale
pub fn fetch_model_list(config: &ApiConfig, pending: &PendingModelList, notices: &PendingNotices) {
    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen_futures::spawn_local;

        let url = config.endpoint("/files/list");
        let pending_clone = pending.0.clone();
        let notices = notices.clone();

        spawn_local(async move {
            tracing::info!("Fetching model list from: {}", url);
            match http::get_json::<Vec<ModelAssetJson>>(&url).await {
                Ok(models) => {
                    if let Ok(mut data) = pending_clone.lock() {
                        *data = Some(models);
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to fetch model list: {}", e);
                    notices.error(format!("Could not load your models: {e}"));
                }
            }
        });
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (config, pending, notices);
        tracing::warn!("Model list fetch not available in native mode");
    }
}

/// Fetch the models shared with the current user
pub fn fetch_shared_models(
    config: &ApiConfig,
    pending: &PendingModelList,
    notices: &PendingNotices,
) {
    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen_futures::spawn_local;

        let url = config.endpoint("/files/shared/list");
        let pending_clone = pending.0.clone();
        let notices = notices.clone();

        spawn_local(async move {
            match http::get_json::<Vec<ModelAssetJson>>(&url).await {
                Ok(models) => {
                    if let Ok(mut data) = pending_clone.lock() {
                        *data = Some(models);
                    }
                }
                Err(e) => notices.error(format!("Could not load shared models: {e}")),
            }
        });
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (config, pending, notices);
    }
}

fn fetch_initial_models(
    config: Res<ApiConfig>,
    pending: Res<PendingModelList>,
    notices: Res<PendingNotices>,
    mut library: ResMut<ModelLibrary>,
) {
    library.loading = true;
    fetch_model_list(&config, &pending, &notices);
}

/// Pick the list endpoint for the current shelf and filters
fn catalog_url(base_url: &str, filter: &CatalogFilter, shelf: CatalogShelf) -> String {
    let query: String = filter
        .to_query()
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    match shelf {
        CatalogShelf::Featured => format!("{base_url}/public-models/featured/list?{query}"),
        CatalogShelf::Popular => format!("{base_url}/public-models/popular/list?{query}"),
        CatalogShelf::Latest => format!("{base_url}/public-models/latest/list?{query}"),
        CatalogShelf::All => {
            if filter.search.is_some() {
                format!("{base_url}/public-models/search?{query}")
            } else if let Some(ref category) = filter.category {
                format!("{base_url}/public-models/by-category/{category}?{query}")
            } else {
                format!("{base_url}/public-models/list?{query}")
            }
        }
    }
}

/// Fetch a catalog page for the given filter state
pub fn fetch_catalog_page(
    config: &ApiConfig,
    filter: &CatalogFilter,
    shelf: CatalogShelf,
    pending: &PendingCatalogPage,
    notices: &PendingNotices,
) {
    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen_futures::spawn_local;

        let url = catalog_url(&config.base_url, filter, shelf);
        let pending_clone = pending.0.clone();
        let notices = notices.clone();

        spawn_local(async move {
            tracing::info!("Fetching catalog page from: {}", url);
            match http::get_json::<PublicModelPage>(&url).await {
                Ok(page) => {
                    if let Ok(mut data) = pending_clone.lock() {
                        *data = Some(page);
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to fetch catalog: {}", e);
                    notices.error(format!("Could not load the public library: {e}"));
                }
            }
        });
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (config, filter, shelf, pending, notices);
    }
}

fn fetch_category_index(
    config: Res<ApiConfig>,
    pending: Res<PendingCategoryIndex>,
    notices: Res<PendingNotices>,
) {
    #[cfg(target_arch = "wasm32")]
    {
        use std::collections::BTreeMap;
        use wasm_bindgen_futures::spawn_local;

        let categories_url = config.endpoint("/public-models/categories");
        let tags_url = config.endpoint("/public-models/tags");
        let pending_clone = pending.0.clone();
        let notices = notices.clone();

        spawn_local(async move {
            let categories = http::get_json::<BTreeMap<String, Vec<String>>>(&categories_url).await;
            let tags = http::get_json::<BTreeMap<String, Vec<String>>>(&tags_url).await;
            match (categories, tags) {
                (Ok(categories), Ok(tag_groups)) => {
                    if let Ok(mut data) = pending_clone.lock() {
                        *data = Some(CategoryIndex {
                            categories,
                            tag_groups,
                        });
                    }
                }
                (Err(e), _) | (_, Err(e)) => {
                    notices.error(format!("Could not load categories: {e}"));
                }
            }
        });
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (config, pending, notices);
    }
}

fn fetch_storage_base(
    config: Res<ApiConfig>,
    pending: Res<PendingStorageBase>,
    notices: Res<PendingNotices>,
) {
    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen_futures::spawn_local;

        let url = config.endpoint("/storage/base-url");
        let pending_clone = pending.0.clone();
        let notices = notices.clone();

        spawn_local(async move {
            match http::get_json::<DownloadUrlJson>(&url).await {
                Ok(base) => {
                    if let Ok(mut data) = pending_clone.lock() {
                        *data = Some(base.url);
                    }
                }
                Err(e) => {
                    // Display links degrade gracefully without it
                    tracing::warn!("Failed to fetch storage base URL: {}", e);
                    let _ = notices;
                }
            }
        });
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (config, pending, notices);
    }
}

/// Fetch the detail record for a scene
pub fn fetch_scene_detail(
    config: &ApiConfig,
    scene_id: &str,
    pending: &PendingSceneDetail,
    notices: &PendingNotices,
) {
    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen_futures::spawn_local;

        let url = config.endpoint(&format!("/scenes/{scene_id}"));
        let pending_clone = pending.0.clone();
        let notices = notices.clone();

        spawn_local(async move {
            match http::get_json::<SceneDetail>(&url).await {
                Ok(detail) => {
                    if let Ok(mut data) = pending_clone.lock() {
                        *data = Some(detail);
                    }
                }
                Err(e) => notices.error(format!("Could not load scene: {e}")),
            }
        });
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (config, scene_id, pending, notices);
    }
}

// ============================================================================
// Mutations (each refetches the affected list on success)
// ============================================================================

/// Delete a user model and refresh the list
pub fn delete_model(
    config: &ApiConfig,
    id: &str,
    pending: &PendingModelList,
    notices: &PendingNotices,
) {
    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen_futures::spawn_local;

        let base = config.base_url.clone();
        let id = id.to_string();
        let pending_clone = pending.0.clone();
        let notices = notices.clone();

        spawn_local(async move {
            match http::delete(&format!("{base}/files/{id}")).await {
                Ok(()) => {
                    notices.info("Model deleted");
                    if let Ok(models) =
                        http::get_json::<Vec<ModelAssetJson>>(&format!("{base}/files/list")).await
                    {
                        if let Ok(mut data) = pending_clone.lock() {
                            *data = Some(models);
                        }
                    }
                }
                Err(e) => notices.error(format!("Delete failed: {e}")),
            }
        });
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (config, id, pending, notices);
    }
}

/// Rename a user model and refresh the list
pub fn rename_model(
    config: &ApiConfig,
    id: &str,
    filename: &str,
    pending: &PendingModelList,
    notices: &PendingNotices,
) {
    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen_futures::spawn_local;

        let base = config.base_url.clone();
        let id = id.to_string();
        let body = serde_json::json!({ "filename": filename });
        let pending_clone = pending.0.clone();
        let notices = notices.clone();

        spawn_local(async move {
            match http::put_json(&format!("{base}/files/{id}"), &body).await {
                Ok(()) => {
                    if let Ok(models) =
                        http::get_json::<Vec<ModelAssetJson>>(&format!("{base}/files/list")).await
                    {
                        if let Ok(mut data) = pending_clone.lock() {
                            *data = Some(models);
                        }
                    }
                }
                Err(e) => notices.error(format!("Rename failed: {e}")),
            }
        });
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (config, id, filename, pending, notices);
    }
}

/// Share a model with other users
pub fn share_model(config: &ApiConfig, id: &str, notices: &PendingNotices) {
    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen_futures::spawn_local;

        let url = config.endpoint(&format!("/files/{id}/share"));
        let notices = notices.clone();

        spawn_local(async move {
            match http::post_empty(&url).await {
                Ok(()) => notices.info("Model shared"),
                Err(e) => notices.error(format!("Share failed: {e}")),
            }
        });
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (config, id, notices);
    }
}

/// Request conversion of a model to a target format
pub fn request_conversion(config: &ApiConfig, id: &str, format: &str, notices: &PendingNotices) {
    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen_futures::spawn_local;

        let url = config.endpoint(&format!("/files/{id}/convert"));
        let body = serde_json::json!({ "targetFormat": format });
        let notices = notices.clone();

        spawn_local(async move {
            match http::post_json::<serde_json::Value, _>(&url, &body).await {
                Ok(_) => notices.info("Conversion requested"),
                Err(e) => notices.error(format!("Conversion request failed: {e}")),
            }
        });
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (config, id, format, notices);
    }
}

/// Check conversion status on demand and refresh the list
pub fn check_conversion_status(
    config: &ApiConfig,
    id: &str,
    pending: &PendingModelList,
    notices: &PendingNotices,
) {
    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen_futures::spawn_local;

        let base = config.base_url.clone();
        let id = id.to_string();
        let pending_clone = pending.0.clone();
        let notices = notices.clone();

        spawn_local(async move {
            match http::get_json::<serde_json::Value>(&format!("{base}/files/convert/status/{id}"))
                .await
            {
                Ok(status) => {
                    let text = status
                        .get("status")
                        .and_then(|s| s.as_str())
                        .unwrap_or("unknown");
                    notices.info(format!("Conversion status: {text}"));
                    if let Ok(models) =
                        http::get_json::<Vec<ModelAssetJson>>(&format!("{base}/files/list")).await
                    {
                        if let Ok(mut data) = pending_clone.lock() {
                            *data = Some(models);
                        }
                    }
                }
                Err(e) => notices.error(format!("Status check failed: {e}")),
            }
        });
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (config, id, pending, notices);
    }
}

/// Update a catalog entry (admin) and refetch the current page
pub fn update_public_model(
    config: &ApiConfig,
    id: &str,
    update: PublicModelUpdate,
    filter: &CatalogFilter,
    shelf: CatalogShelf,
    pending: &PendingCatalogPage,
    notices: &PendingNotices,
) {
    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen_futures::spawn_local;

        let base = config.base_url.clone();
        let id = id.to_string();
        let refetch_url = catalog_url(&base, filter, shelf);
        let pending_clone = pending.0.clone();
        let notices = notices.clone();

        spawn_local(async move {
            match http::put_json(&format!("{base}/public-models/{id}"), &update).await {
                Ok(()) => {
                    notices.info("Catalog entry updated");
                    if let Ok(page) = http::get_json::<PublicModelPage>(&refetch_url).await {
                        if let Ok(mut data) = pending_clone.lock() {
                            *data = Some(page);
                        }
                    }
                }
                Err(e) => notices.error(format!("Update failed: {e}")),
            }
        });
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (config, id, update, filter, shelf, pending, notices);
    }
}

/// Delete a catalog entry (admin) and refetch the current page
pub fn delete_public_model(
    config: &ApiConfig,
    id: &str,
    filter: &CatalogFilter,
    shelf: CatalogShelf,
    pending: &PendingCatalogPage,
    notices: &PendingNotices,
) {
    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen_futures::spawn_local;

        let base = config.base_url.clone();
        let id = id.to_string();
        let refetch_url = catalog_url(&base, filter, shelf);
        let pending_clone = pending.0.clone();
        let notices = notices.clone();

        spawn_local(async move {
            match http::delete(&format!("{base}/public-models/{id}")).await {
                Ok(()) => {
                    notices.info("Catalog entry deleted");
                    if let Ok(page) = http::get_json::<PublicModelPage>(&refetch_url).await {
                        if let Ok(mut data) = pending_clone.lock() {
                            *data = Some(page);
                        }
                    }
                }
                Err(e) => notices.error(format!("Delete failed: {e}")),
            }
        });
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (config, id, filter, shelf, pending, notices);
    }
}

/// Update a single property on a scene
pub fn update_scene_property(
    config: &ApiConfig,
    scene_id: &str,
    property: &str,
    value: serde_json::Value,
    notices: &PendingNotices,
) {
    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen_futures::spawn_local;

        let url = config.endpoint(&format!("/scenes/{scene_id}/property"));
        let body = geoforge_core::ScenePropertyUpdate {
            property: property.to_string(),
            value,
        };
        let notices = notices.clone();

        spawn_local(async move {
            match http::put_json(&url, &body).await {
                Ok(()) => {}
                Err(e) => notices.error(format!("Scene update failed: {e}")),
            }
        });
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (config, scene_id, property, value, notices);
    }
}

// ============================================================================
// Uploads (multipart: binary file + JSON-serialized metadata)
// ============================================================================

#[cfg(target_arch = "wasm32")]
fn form_with_file(
    field: &str,
    name: &str,
    bytes: &[u8],
) -> Result<web_sys::FormData, String> {
    let form = web_sys::FormData::new().map_err(|e| format!("form: {e:?}"))?;
    let array = js_sys::Uint8Array::from(bytes);
    let parts = js_sys::Array::new();
    parts.push(&array.buffer());
    let blob =
        web_sys::Blob::new_with_u8_array_sequence(&parts).map_err(|e| format!("blob: {e:?}"))?;
    form.append_with_blob_and_filename(field, &blob, name)
        .map_err(|e| format!("form append: {e:?}"))?;
    Ok(form)
}

/// Upload a batch of model files strictly sequentially, reporting running
/// success/failure counts. The list is refreshed afterward regardless of
/// partial failure.
pub fn upload_models(
    config: &ApiConfig,
    files: Vec<(String, Vec<u8>)>,
    pending: &PendingModelList,
    notices: &PendingNotices,
) {
    #[cfg(target_arch = "wasm32")]
    {
        use geoforge_core::{BatchUploadReport, UploadMetadata};
        use wasm_bindgen_futures::spawn_local;

        let base = config.base_url.clone();
        let pending_clone = pending.0.clone();
        let notices = notices.clone();

        spawn_local(async move {
            let url = format!("{base}/files/upload");
            let mut report = BatchUploadReport::default();

            for (name, bytes) in files {
                let metadata = UploadMetadata {
                    filename: name.clone(),
                    target_format: (!name.to_lowercase().ends_with(".glb"))
                        .then(|| "glb".to_string()),
                };
                let result = async {
                    let form = form_with_file("file", &name, &bytes)?;
                    let metadata_json =
                        serde_json::to_string(&metadata).map_err(|e| e.to_string())?;
                    form.append_with_str("metadata", &metadata_json)
                        .map_err(|e| format!("form append: {e:?}"))?;
                    http::send_form("POST", &url, form).await
                }
                .await;

                match result {
                    Ok(()) => {
                        report.record_success();
                        notices.info(format!("{name}: {}", report.summary()));
                    }
                    Err(e) => {
                        report.record_failure();
                        tracing::error!("Upload of {} failed: {}", name, e);
                        notices.error(format!("{name} failed: {e}"));
                    }
                }
            }

            notices.info(format!("Upload finished: {}", report.summary()));

            // Refresh even after partial failure
            if let Ok(models) =
                http::get_json::<Vec<ModelAssetJson>>(&format!("{base}/files/list")).await
            {
                if let Ok(mut data) = pending_clone.lock() {
                    *data = Some(models);
                }
            }
        });
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (config, files, pending, notices);
        tracing::warn!("Upload not available in native mode");
    }
}

/// Upload a model to the public catalog (admin) and refetch the page
pub fn upload_public_model(
    config: &ApiConfig,
    file: (String, Vec<u8>),
    category: String,
    filter: &CatalogFilter,
    shelf: CatalogShelf,
    pending: &PendingCatalogPage,
    notices: &PendingNotices,
) {
    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen_futures::spawn_local;

        let base = config.base_url.clone();
        let refetch_url = catalog_url(&base, filter, shelf);
        let pending_clone = pending.0.clone();
        let notices = notices.clone();

        spawn_local(async move {
            let (name, bytes) = file;
            let result = async {
                let form = form_with_file("file", &name, &bytes)?;
                let metadata = serde_json::json!({
                    "filename": name,
                    "category": category,
                });
                form.append_with_str("metadata", &metadata.to_string())
                    .map_err(|e| format!("form append: {e:?}"))?;
                http::send_form("POST", &format!("{base}/public-models/upload"), form).await
            }
            .await;

            match result {
                Ok(()) => {
                    notices.info("Catalog upload complete");
                    if let Ok(page) = http::get_json::<PublicModelPage>(&refetch_url).await {
                        if let Ok(mut data) = pending_clone.lock() {
                            *data = Some(page);
                        }
                    }
                }
                Err(e) => notices.error(format!("Catalog upload failed: {e}")),
            }
        });
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (config, file, category, filter, shelf, pending, notices);
    }
}

/// Replace the preview image of an asset
pub fn upload_preview_image(
    config: &ApiConfig,
    id: &str,
    is_public: bool,
    file: (String, Vec<u8>),
    notices: &PendingNotices,
) {
    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen_futures::spawn_local;

        let url = if is_public {
            config.endpoint(&format!("/public-models/{id}/preview-image"))
        } else {
            config.endpoint(&format!("/files/{id}/preview-image"))
        };
        let notices = notices.clone();

        spawn_local(async move {
            let (name, bytes) = file;
            let result = async {
                let form = form_with_file("image", &name, &bytes)?;
                http::send_form("PUT", &url, form).await
            }
            .await;

            match result {
                Ok(()) => notices.info("Preview image updated"),
                Err(e) => notices.error(format!("Preview image update failed: {e}")),
            }
        });
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (config, id, is_public, file, notices);
    }
}

/// Replace the preview image of the scene itself
pub fn upload_scene_preview(
    config: &ApiConfig,
    scene_id: &str,
    bytes: Vec<u8>,
    notices: &PendingNotices,
) {
    #[cfg(target_arch = "wasm32")]
    {
        use wasm_bindgen_futures::spawn_local;

        let url = config.endpoint(&format!("/scenes/{scene_id}/preview-image"));
        let notices = notices.clone();

        spawn_local(async move {
            let result = async {
                let form = form_with_file("image", "scene-preview.png", &bytes)?;
                http::send_form("PUT", &url, form).await
            }
            .await;

            match result {
                Ok(()) => notices.info("Scene preview updated"),
                Err(e) => notices.error(format!("Scene preview update failed: {e}")),
            }
        });
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (config, scene_id, bytes, notices);
    }
}

// ============================================================================
// Process systems draining pending queues into resources
// ============================================================================

fn process_model_list(pending: Res<PendingModelList>, mut library: ResMut<ModelLibrary>) {
    if let Ok(mut data) = pending.0.lock() {
        if let Some(fetched) = data.take() {
            library.assets = fetched.into_iter().map(ModelAsset::from).collect();
            library.loading = false;
        }
    }
}

fn process_catalog_page(pending: Res<PendingCatalogPage>, mut catalog: ResMut<PublicCatalog>) {
    if let Ok(mut data) = pending.0.lock() {
        if let Some(page) = data.take() {
            catalog.items = page.items;
            catalog.total = page.total;
            catalog.loading = false;
        }
    }
}

fn process_category_index(pending: Res<PendingCategoryIndex>, mut state: ResMut<CategoryState>) {
    if let Ok(mut data) = pending.0.lock() {
        if let Some(index) = data.take() {
            state.index = index;
            state.loaded = true;
        }
    }
}

fn process_scene_detail(
    pending: Res<PendingSceneDetail>,
    mut active: ResMut<ActiveScene>,
    mut origin: ResMut<SceneOrigin>,
) {
    if let Ok(mut data) = pending.0.lock() {
        if let Some(detail) = data.take() {
            if let Some(scene_origin) = detail.origin {
                origin.0 = geoforge_core::Geodetic::from_degrees(
                    scene_origin.lon,
                    scene_origin.lat,
                    scene_origin.height,
                );
            }
            active.id = Some(detail.id.clone());
            active.detail = Some(detail);
        }
    }
}

fn process_storage_base(pending: Res<PendingStorageBase>, mut storage: ResMut<StorageBase>) {
    if let Ok(mut data) = pending.0.lock() {
        if let Some(base) = data.take() {
            storage.0 = Some(base);
        }
    }
}

fn process_notices(pending: Res<PendingNotices>, mut notifications: ResMut<Notifications>) {
    if let Ok(mut queue) = pending.0.lock() {
        for (kind, message) in queue.drain(..) {
            match kind {
                NoticeKind::Info => notifications.info(message),
                NoticeKind::Error => notifications.error(message),
            }
        }
    }
}

/// Refetch the catalog whenever the filter state diverges from what the
/// current list was fetched with. Responses are not cancelled, so a slow
/// stale response can still overwrite a newer one.
fn refetch_catalog_on_filter_change(
    config: Res<ApiConfig>,
    mut catalog: ResMut<PublicCatalog>,
    pending: Res<PendingCatalogPage>,
    notices: Res<PendingNotices>,
) {
    if !catalog.needs_fetch() {
        return;
    }
    catalog.loading = true;
    catalog.fetched_with = Some((catalog.filter.clone(), catalog.shelf));
    fetch_catalog_page(&config, &catalog.filter.clone(), catalog.shelf, &pending, &notices);
}
