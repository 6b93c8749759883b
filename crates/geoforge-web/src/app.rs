//! Bevy application setup and UI-facing state

use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use bevy_picking::{prelude::MeshPickingPlugin, DefaultPickingPlugins};

use geoforge_core::{CatalogFilter, CategoryIndex, ModelAsset, PublicModelMetadata, SceneDetail};
use geoforge_scene::GeoForgeScenePlugin;

use crate::dragdrop::DragDropPlugin;
use crate::file_picker::FilePickerPlugin;
use crate::network::NetworkPlugin;
use crate::scene_load::SceneLoadPlugin;
use crate::ui::UiPlugin;

/// The user's own uploaded models
#[derive(Debug, Clone, Resource, Default)]
pub struct ModelLibrary {
    pub assets: Vec<ModelAsset>,
    pub loading: bool,
    /// Client-side "GLB only" view filter
    pub glb_only: bool,
    /// Showing the shared-with-me list instead of the user's own
    pub showing_shared: bool,
}

impl ModelLibrary {
    pub fn visible(&self) -> impl Iterator<Item = &ModelAsset> {
        self.assets
            .iter()
            .filter(move |a| !self.glb_only || a.is_glb())
    }

    pub fn find(&self, id: &str) -> Option<&ModelAsset> {
        self.assets.iter().find(|a| a.id.as_str() == id)
    }
}

/// Which catalog shelf is being browsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatalogShelf {
    #[default]
    All,
    Featured,
    Popular,
    Latest,
}

impl CatalogShelf {
    pub fn label(&self) -> &'static str {
        match self {
            CatalogShelf::All => "All",
            CatalogShelf::Featured => "Featured",
            CatalogShelf::Popular => "Popular",
            CatalogShelf::Latest => "Latest",
        }
    }
}

/// The shared public model catalog
#[derive(Debug, Clone, Resource, Default)]
pub struct PublicCatalog {
    pub items: Vec<PublicModelMetadata>,
    pub total: u64,
    pub loading: bool,
    pub filter: CatalogFilter,
    pub shelf: CatalogShelf,
    /// Filter state the current list was fetched with. Compared against
    /// `filter` to decide when a refetch is due.
    pub fetched_with: Option<(CatalogFilter, CatalogShelf)>,
}

impl PublicCatalog {
    pub fn find(&self, id: &str) -> Option<&PublicModelMetadata> {
        self.items.iter().find(|m| m.id == id)
    }

    pub fn needs_fetch(&self) -> bool {
        !self.loading
            && self.fetched_with.as_ref() != Some(&(self.filter.clone(), self.shelf))
    }
}

/// Category and tag vocabulary, fetched once
#[derive(Debug, Clone, Resource, Default)]
pub struct CategoryState {
    pub index: CategoryIndex,
    pub loaded: bool,
}

/// Scene currently open in the editor
#[derive(Debug, Clone, Resource, Default)]
pub struct ActiveScene {
    pub id: Option<String>,
    pub detail: Option<SceneDetail>,
}

/// Which asset tab is shown in the library panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Resource, Default)]
pub enum LibraryTab {
    #[default]
    MyModels,
    PublicLibrary,
    Materials,
}

/// Severity of a transient notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub remaining_secs: f32,
}

/// Transient, non-blocking user notifications
#[derive(Debug, Clone, Resource, Default)]
pub struct Notifications {
    pub entries: Vec<Notice>,
}

impl Notifications {
    pub fn info(&mut self, message: impl Into<String>) {
        self.push(NoticeKind::Info, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(NoticeKind::Error, message.into());
    }

    fn push(&mut self, kind: NoticeKind, message: String) {
        tracing::info!("notice: {}", message);
        self.entries.push(Notice {
            kind,
            message,
            remaining_secs: 6.0,
        });
    }
}

/// Age out expired notifications
fn expire_notifications(time: Res<Time>, mut notifications: ResMut<Notifications>) {
    let dt = time.delta_secs();
    for notice in notifications.entries.iter_mut() {
        notice.remaining_secs -= dt;
    }
    notifications.entries.retain(|n| n.remaining_secs > 0.0);
}

/// UI layout settings for responsive design
#[derive(Debug, Clone, Resource)]
pub struct UiLayout {
    pub show_library_panel: bool,
    pub screen_width: f32,
    pub screen_height: f32,
    pub is_mobile: bool,
}

impl Default for UiLayout {
    fn default() -> Self {
        Self {
            show_library_panel: true,
            screen_width: 1920.0,
            screen_height: 1080.0,
            is_mobile: false,
        }
    }
}

impl UiLayout {
    pub fn update_for_screen(&mut self, width: f32, height: f32) {
        self.screen_width = width;
        self.screen_height = height;

        let was_mobile = self.is_mobile;
        self.is_mobile = width < 800.0 || (width < height && width < 600.0);
        if self.is_mobile && !was_mobile {
            self.show_library_panel = false;
        }
    }

    pub fn panel_width(&self) -> f32 {
        if self.is_mobile {
            (self.screen_width * 0.85).min(320.0)
        } else {
            320.0
        }
    }
}

/// Run the Bevy application
pub fn run() {
    App::new()
        .insert_resource(ClearColor(Color::srgb(0.08, 0.1, 0.14)))
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "GeoForge Scene Editor".to_string(),
                        canvas: Some("#geoforge-canvas".to_string()),
                        fit_canvas_to_parent: true,
                        prevent_default_event_handling: false,
                        ..default()
                    }),
                    ..default()
                })
                .set(AssetPlugin {
                    // Assets are absolute URLs into object storage
                    file_path: "".to_string(),
                    // Don't look for .meta files - storage doesn't have them
                    meta_check: bevy::asset::AssetMetaCheck::Never,
                    ..default()
                }),
        )
        // Picking plugins must be added BEFORE EguiPlugin so it can detect
        // PickingPlugin (bevy_egui checks for the bevy_picking crate)
        .add_plugins(DefaultPickingPlugins)
        .add_plugins(MeshPickingPlugin)
        .add_plugins(EguiPlugin::default())
        .init_resource::<ModelLibrary>()
        .init_resource::<PublicCatalog>()
        .init_resource::<CategoryState>()
        .init_resource::<ActiveScene>()
        .init_resource::<LibraryTab>()
        .init_resource::<Notifications>()
        .init_resource::<UiLayout>()
        .add_plugins(GeoForgeScenePlugin)
        .add_plugins(NetworkPlugin)
        .add_plugins(SceneLoadPlugin)
        .add_plugins(DragDropPlugin)
        .add_plugins(FilePickerPlugin)
        .add_plugins(UiPlugin)
        .add_systems(Update, expire_notifications)
        .run();
}
