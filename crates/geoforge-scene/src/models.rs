//! glTF model loading and caching

use bevy::asset::LoadState;
use bevy::prelude::*;
use std::collections::HashMap;

pub struct ModelsPlugin;

impl Plugin for ModelsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ModelCache>()
            .add_systems(Update, poll_loading_models);
    }
}

/// Cache of loaded model scene handles, keyed by download URL
#[derive(Resource, Default)]
pub struct ModelCache {
    pub models: HashMap<String, Handle<Scene>>,
    pub loading: HashMap<String, Handle<Gltf>>,
    pub ready: HashMap<String, bool>,
    /// URLs that failed since the last drain, for user-facing reporting
    new_failures: Vec<String>,
}

impl ModelCache {
    /// Start loading a model unless it is already loading or loaded
    pub fn request(&mut self, asset_server: &AssetServer, url: &str) {
        if self.loading.contains_key(url)
            || self.models.contains_key(url)
            || self.ready.contains_key(url)
        {
            return;
        }
        tracing::info!("Starting to load model: {}", url);
        let handle: Handle<Gltf> = asset_server.load(url.to_string());
        self.loading.insert(url.to_string(), handle);
    }

    /// Scene handle for a fully loaded model
    pub fn scene_for(&self, url: &str) -> Option<Handle<Scene>> {
        self.models.get(url).cloned()
    }

    pub fn is_failed(&self, url: &str) -> bool {
        self.ready.get(url) == Some(&false)
    }

    /// Drain URLs that failed since the last call
    pub fn take_failures(&mut self) -> Vec<String> {
        std::mem::take(&mut self.new_failures)
    }
}

/// Check loading state and extract scenes from loaded GLTFs
fn poll_loading_models(
    mut cache: ResMut<ModelCache>,
    asset_server: Res<AssetServer>,
    gltf_assets: Res<Assets<Gltf>>,
) {
    let loading_keys: Vec<String> = cache.loading.keys().cloned().collect();
    for key in loading_keys {
        let Some(handle) = cache.loading.get(&key) else {
            continue;
        };

        match asset_server.get_load_state(handle.id()) {
            Some(LoadState::Loaded) => {
                if let Some(gltf) = gltf_assets.get(handle) {
                    let scene_handle = gltf
                        .default_scene
                        .clone()
                        .or_else(|| gltf.scenes.first().cloned());
                    if let Some(scene_handle) = scene_handle {
                        tracing::info!("Model loaded: {}", key);
                        cache.models.insert(key.clone(), scene_handle);
                        cache.ready.insert(key.clone(), true);
                    } else {
                        tracing::error!("Model has no scenes: {}", key);
                        cache.ready.insert(key.clone(), false);
                        cache.new_failures.push(key.clone());
                    }
                }
                cache.loading.remove(&key);
            }
            Some(LoadState::Failed(_)) => {
                tracing::error!("Failed to load model: {}", key);
                cache.loading.remove(&key);
                cache.ready.insert(key.clone(), false);
                cache.new_failures.push(key);
            }
            _ => {
                // Still loading
            }
        }
    }
}

/// Resolve a possibly-relative asset path against the storage base URL
pub fn resolve_asset_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::resolve_asset_url;

    #[test]
    fn test_absolute_urls_pass_through() {
        assert_eq!(
            resolve_asset_url("https://storage.example", "https://cdn.example/a.glb"),
            "https://cdn.example/a.glb"
        );
    }

    #[test]
    fn test_relative_paths_join_cleanly() {
        assert_eq!(
            resolve_asset_url("https://storage.example/", "/models/a.glb"),
            "https://storage.example/models/a.glb"
        );
        assert_eq!(
            resolve_asset_url("https://storage.example", "models/a.glb"),
            "https://storage.example/models/a.glb"
        );
    }
}
