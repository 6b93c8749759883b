//! Bevy application setup for the preview route

use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use bevy_picking::{prelude::MeshPickingPlugin, DefaultPickingPlugins};

use geoforge_scene::GeoForgeScenePlugin;

use crate::loader::PreviewLoaderPlugin;
use crate::ui::PreviewUiPlugin;

/// What the preview route was asked to show, from URL query parameters:
/// `model` (id), `isPublicModel`, `hasPreviewImage`, optional `api`.
#[derive(Debug, Clone, Resource, Default)]
pub struct PreviewRequest {
    pub model_id: Option<String>,
    pub is_public_model: bool,
    pub has_preview_image: bool,
    pub api_base: String,
}

/// Progress of the preview load and capture
#[derive(Debug, Clone, Resource, Default)]
pub struct PreviewState {
    pub loading: bool,
    pub error: Option<String>,
    pub model_name: String,
    pub model_url: Option<String>,
    /// The model is in the scene and visible
    pub displayed: bool,
    /// A preview image was captured and uploaded this session
    pub captured: bool,
}

/// Run the Bevy application
pub fn run() {
    App::new()
        .insert_resource(ClearColor(Color::srgb(0.12, 0.13, 0.16)))
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "GeoForge Preview".to_string(),
                        canvas: Some("#geoforge-preview-canvas".to_string()),
                        fit_canvas_to_parent: true,
                        prevent_default_event_handling: false,
                        ..default()
                    }),
                    ..default()
                })
                .set(AssetPlugin {
                    file_path: "".to_string(),
                    meta_check: bevy::asset::AssetMetaCheck::Never,
                    ..default()
                }),
        )
        .add_plugins(DefaultPickingPlugins)
        .add_plugins(MeshPickingPlugin)
        .add_plugins(EguiPlugin::default())
        .init_resource::<PreviewRequest>()
        .init_resource::<PreviewState>()
        .add_plugins(GeoForgeScenePlugin)
        .add_plugins(PreviewLoaderPlugin)
        .add_plugins(PreviewUiPlugin)
        .run();
}
