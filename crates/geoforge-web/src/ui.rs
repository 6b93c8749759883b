//! UI overlays using bevy_egui

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};

use geoforge_core::{DragPayload, PublicModelUpdate, BUILTIN_MATERIALS};
use geoforge_scene::terrain::ViewerSettings;
use geoforge_scene::MainCamera;

use crate::app::{
    ActiveScene, CatalogShelf, CategoryState, LibraryTab, ModelLibrary, NoticeKind, Notifications,
    PublicCatalog, UiLayout,
};
use crate::dragdrop::{DragState, ModelPlaced};
use crate::file_picker::{
    trigger_file_open, FileFilter, FilePickerContext, PendingFileResults,
};
use crate::network::{
    check_conversion_status, delete_model, delete_public_model, fetch_model_list,
    fetch_scene_detail, fetch_shared_models, rename_model, request_conversion, share_model,
    update_public_model, upload_models, upload_preview_image, upload_public_model, ApiConfig,
    PendingCatalogPage, PendingModelList, PendingNotices, PendingSceneDetail, StorageBase,
};
use crate::scene_load::{load_scene_instances, PendingInstanceBatch, SceneInstances, SplatPlaceholder};

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<EditorForms>()
            .init_resource::<ScenePreviewCapture>()
            .add_systems(
                Update,
                (
                    update_ui_layout,
                    process_picked_files,
                    refresh_scene_on_placed,
                    run_scene_preview_capture,
                ),
            )
            // Main UI runs in EguiPrimaryContextPass for proper input handling
            .add_systems(EguiPrimaryContextPass, (ui_system, splat_labels).chain());
    }
}

/// Countdown letting a render complete before the scene preview capture
#[derive(Resource, Default)]
pub struct ScenePreviewCapture {
    pub timer: Option<Timer>,
}

/// Form buffers for the panels
#[derive(Resource, Default)]
pub struct EditorForms {
    pub scene_id_input: String,
    pub search_input: String,
    pub rename_for: Option<String>,
    pub rename_value: String,
    pub admin_open_for: Option<String>,
    pub admin_filename: String,
    pub admin_category: String,
    pub admin_sub_category: String,
    pub admin_description: String,
    pub admin_tags: String,
    pub admin_featured: bool,
}

/// Update UI layout based on window size
fn update_ui_layout(windows: Query<&Window>, mut ui_layout: ResMut<UiLayout>) {
    if let Ok(window) = windows.single() {
        let width = window.width();
        let height = window.height();

        if (ui_layout.screen_width - width).abs() > 1.0
            || (ui_layout.screen_height - height).abs() > 1.0
        {
            ui_layout.update_for_screen(width, height);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn ui_system(
    mut contexts: EguiContexts,
    mut layout: ResMut<UiLayout>,
    mut tab: ResMut<LibraryTab>,
    mut library: ResMut<ModelLibrary>,
    mut catalog: ResMut<PublicCatalog>,
    mut category_state: ResMut<CategoryState>,
    mut drag_state: ResMut<DragState>,
    notifications: Res<Notifications>,
    mut viewer_settings: ResMut<ViewerSettings>,
    mut forms: ResMut<EditorForms>,
    net: (
        Res<ApiConfig>,
        Res<PendingModelList>,
        Res<PendingCatalogPage>,
        Res<PendingSceneDetail>,
        Res<PendingNotices>,
    ),
    scene: (
        ResMut<ActiveScene>,
        ResMut<SceneInstances>,
        Res<PendingInstanceBatch>,
        Res<StorageBase>,
    ),
    picker: Res<PendingFileResults>,
    mut preview_capture: ResMut<ScenePreviewCapture>,
    mut commands: Commands,
) {
    let (config, pending_models, pending_catalog, pending_scene, notices) =
        (&net.0, &net.1, &net.2, &net.3, &net.4);
    let (mut active_scene, mut instances, pending_batch, storage) =
        (scene.0, scene.1, scene.2, scene.3);

    let Ok(ctx) = contexts.ctx_mut() else { return };

    // Toolbar
    egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            if ui.button("☰").clicked() {
                layout.show_library_panel = !layout.show_library_panel;
            }
            ui.heading("GeoForge");
            ui.separator();

            ui.label("Scene:");
            ui.add(
                egui::TextEdit::singleline(&mut forms.scene_id_input).desired_width(140.0),
            );
            let can_open = !forms.scene_id_input.trim().is_empty();
            if ui.add_enabled(can_open, egui::Button::new("Open")).clicked() {
                let scene_id = forms.scene_id_input.trim().to_string();
                fetch_scene_detail(config, &scene_id, pending_scene, notices);
                load_scene_instances(
                    &scene_id,
                    config,
                    &storage,
                    &pending_batch,
                    &mut instances,
                    notices,
                );
            }
            if active_scene.id.is_some() && ui.button("Close").clicked() {
                instances.clear(&mut commands);
                active_scene.id = None;
                active_scene.detail = None;
            }
            if active_scene.id.is_some() && ui.button("📷 Preview").clicked() {
                // Let a frame render before reading the canvas back
                preview_capture.timer = Some(Timer::from_seconds(0.4, TimerMode::Once));
            }
            if let Some(ref detail) = active_scene.detail {
                ui.label(egui::RichText::new(&detail.name).strong());
            }
            if instances.tracker.is_loading() {
                ui.spinner();
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.checkbox(&mut viewer_settings.show_axis, "Axes");
                ui.checkbox(&mut viewer_settings.show_grid, "Grid");
            });
        });
    });

    // Library panel (left side)
    if layout.show_library_panel {
        let panel_width = layout.panel_width();
        egui::SidePanel::left("library_panel")
            .default_width(panel_width)
            .resizable(!layout.is_mobile)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    for (value, label) in [
                        (LibraryTab::MyModels, "My Models"),
                        (LibraryTab::PublicLibrary, "Public Library"),
                        (LibraryTab::Materials, "Materials"),
                    ] {
                        if ui.selectable_label(*tab == value, label).clicked() {
                            *tab = value;
                        }
                    }
                });
                ui.separator();

                match *tab {
                    LibraryTab::MyModels => my_models_tab(
                        ui,
                        &mut library,
                        &mut drag_state,
                        &mut forms,
                        config,
                        pending_models,
                        notices,
                        &picker,
                    ),
                    LibraryTab::PublicLibrary => public_library_tab(
                        ui,
                        &mut catalog,
                        &mut category_state,
                        &mut drag_state,
                        &mut forms,
                        config,
                        pending_catalog,
                        notices,
                        &picker,
                    ),
                    LibraryTab::Materials => materials_tab(ui, &mut drag_state),
                }
            });
    }

    // Live coordinate readout during a drag
    if drag_state.is_dragging() {
        if let Some(geo) = drag_state.hover {
            egui::Area::new(egui::Id::new("drag_coordinate"))
                .anchor(egui::Align2::CENTER_BOTTOM, [0.0, -16.0])
                .show(ctx, |ui| {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.label(format!(
                            "lon {:.6}°  lat {:.6}°",
                            geo.lon_deg(),
                            geo.lat_deg()
                        ));
                    });
                });
        }
    }

    // Notification toasts (top right)
    if !notifications.entries.is_empty() {
        egui::Area::new(egui::Id::new("notifications"))
            .anchor(egui::Align2::RIGHT_TOP, [-12.0, 40.0])
            .show(ctx, |ui| {
                for notice in &notifications.entries {
                    let color = match notice.kind {
                        NoticeKind::Info => egui::Color32::from_rgb(70, 140, 90),
                        NoticeKind::Error => egui::Color32::from_rgb(170, 70, 60),
                    };
                    egui::Frame::popup(ui.style())
                        .fill(color.gamma_multiply(0.25))
                        .show(ui, |ui| {
                            ui.colored_label(color, &notice.message);
                        });
                }
            });
    }
}

#[allow(clippy::too_many_arguments)]
fn my_models_tab(
    ui: &mut egui::Ui,
    library: &mut ModelLibrary,
    drag_state: &mut DragState,
    forms: &mut EditorForms,
    config: &ApiConfig,
    pending_models: &PendingModelList,
    notices: &PendingNotices,
    picker: &PendingFileResults,
) {
    ui.horizontal(|ui| {
        ui.checkbox(&mut library.glb_only, "GLB only");
        if ui
            .selectable_label(library.showing_shared, "Shared")
            .clicked()
        {
            library.showing_shared = !library.showing_shared;
            library.loading = true;
            if library.showing_shared {
                fetch_shared_models(config, pending_models, notices);
            } else {
                fetch_model_list(config, pending_models, notices);
            }
        }
        if ui.button("⟳").clicked() {
            library.loading = true;
            if library.showing_shared {
                fetch_shared_models(config, pending_models, notices);
            } else {
                fetch_model_list(config, pending_models, notices);
            }
        }
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("Upload…").clicked() {
                trigger_file_open(picker, FilePickerContext::ModelUpload, FileFilter::models());
            }
        });
    });
    ui.separator();

    if library.loading {
        ui.label("Loading models...");
    }

    let assets: Vec<_> = library.visible().cloned().collect();
    egui::ScrollArea::vertical()
        .id_salt("my_models_scroll")
        .show(ui, |ui| {
            if assets.is_empty() && !library.loading {
                ui.label("No models yet. Upload one to get started.");
            }
            for asset in &assets {
                ui.horizontal(|ui| {
                    let handle = ui.add(
                        egui::Label::new("≡")
                            .sense(egui::Sense::drag()),
                    );
                    if handle.drag_started() {
                        drag_state.begin(DragPayload::Model(asset.id.to_string()));
                    }
                    handle.on_hover_text("Drag onto the viewer");

                    ui.label(&asset.name);
                    if asset.is_glb() {
                        ui.label(egui::RichText::new("GLB").small().weak());
                    }
                    if asset.preview_image.is_some() {
                        ui.label(egui::RichText::new("🖼").small());
                    }

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.menu_button("⋮", |ui| {
                            if ui.button("Rename").clicked() {
                                forms.rename_for = Some(asset.id.to_string());
                                forms.rename_value = asset.name.clone();
                                ui.close();
                            }
                            if !asset.is_glb() && ui.button("Convert to GLB").clicked() {
                                request_conversion(config, asset.id.as_str(), "glb", notices);
                                ui.close();
                            }
                            if asset.conversion.is_some()
                                && ui.button("Check conversion").clicked()
                            {
                                check_conversion_status(
                                    config,
                                    asset.id.as_str(),
                                    pending_models,
                                    notices,
                                );
                                ui.close();
                            }
                            if ui.button("Share").clicked() {
                                share_model(config, asset.id.as_str(), notices);
                                ui.close();
                            }
                            if ui.button("Preview image…").clicked() {
                                trigger_file_open(
                                    picker,
                                    FilePickerContext::PreviewImage {
                                        id: asset.id.to_string(),
                                        is_public: false,
                                    },
                                    FileFilter::images(),
                                );
                                ui.close();
                            }
                            ui.separator();
                            if ui.button("Delete").clicked() {
                                delete_model(config, asset.id.as_str(), pending_models, notices);
                                ui.close();
                            }
                        });
                    });
                });

                if forms.rename_for.as_deref() == Some(asset.id.as_str()) {
                    ui.horizontal(|ui| {
                        ui.text_edit_singleline(&mut forms.rename_value);
                        let valid = !forms.rename_value.trim().is_empty();
                        if ui.add_enabled(valid, egui::Button::new("Save")).clicked() {
                            rename_model(
                                config,
                                asset.id.as_str(),
                                forms.rename_value.trim(),
                                pending_models,
                                notices,
                            );
                            forms.rename_for = None;
                        }
                        if ui.button("Cancel").clicked() {
                            forms.rename_for = None;
                        }
                    });
                }
            }
        });
}

#[allow(clippy::too_many_arguments)]
fn public_library_tab(
    ui: &mut egui::Ui,
    catalog: &mut PublicCatalog,
    category_state: &mut CategoryState,
    drag_state: &mut DragState,
    forms: &mut EditorForms,
    config: &ApiConfig,
    pending_catalog: &PendingCatalogPage,
    notices: &PendingNotices,
    picker: &PendingFileResults,
) {
    // Shelf row
    ui.horizontal(|ui| {
        for shelf in [
            CatalogShelf::All,
            CatalogShelf::Featured,
            CatalogShelf::Popular,
            CatalogShelf::Latest,
        ] {
            if ui
                .selectable_label(catalog.shelf == shelf, shelf.label())
                .clicked()
            {
                catalog.shelf = shelf;
                catalog.filter.page = 1;
            }
        }
    });

    // Search commits on Enter
    ui.horizontal(|ui| {
        let response = ui.add(
            egui::TextEdit::singleline(&mut forms.search_input)
                .hint_text("Search")
                .desired_width(160.0),
        );
        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            catalog.filter.set_search(forms.search_input.trim().to_string());
        }
        if ui.button("Clear").clicked() {
            forms.search_input.clear();
            catalog.filter.set_search(String::new());
        }
    });

    // Collect option lists up front to avoid borrow issues in the combos
    let categories: Vec<String> = category_state.index.categories.keys().cloned().collect();
    let sub_categories: Vec<String> = catalog
        .filter
        .category
        .as_deref()
        .map(|c| category_state.index.sub_categories_of(c).to_vec())
        .unwrap_or_default();
    let tags: Vec<String> = category_state
        .index
        .all_tags()
        .into_iter()
        .map(|s| s.to_string())
        .collect();

    ui.horizontal(|ui| {
        let selected = catalog
            .filter
            .category
            .clone()
            .unwrap_or_else(|| "All".to_string());
        egui::ComboBox::from_id_salt("category_combo")
            .selected_text(selected)
            .show_ui(ui, |ui| {
                if ui
                    .selectable_label(catalog.filter.category.is_none(), "All")
                    .clicked()
                {
                    catalog.filter.set_category(None);
                }
                for category in &categories {
                    let active = catalog.filter.category.as_deref() == Some(category.as_str());
                    if ui.selectable_label(active, category).clicked() {
                        catalog.filter.set_category(Some(category.clone()));
                    }
                }
            });

        if catalog.filter.category.is_some() {
            let selected = catalog
                .filter
                .sub_category
                .clone()
                .unwrap_or_else(|| "All".to_string());
            egui::ComboBox::from_id_salt("sub_category_combo")
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    if ui
                        .selectable_label(catalog.filter.sub_category.is_none(), "All")
                        .clicked()
                    {
                        catalog.filter.set_sub_category(None);
                    }
                    for sub in &sub_categories {
                        let active =
                            catalog.filter.sub_category.as_deref() == Some(sub.as_str());
                        if ui.selectable_label(active, sub).clicked() {
                            catalog.filter.set_sub_category(Some(sub.clone()));
                        }
                    }
                });
        }

        let selected = catalog
            .filter
            .tag
            .clone()
            .unwrap_or_else(|| "Any tag".to_string());
        egui::ComboBox::from_id_salt("tag_combo")
            .selected_text(selected)
            .show_ui(ui, |ui| {
                if ui
                    .selectable_label(catalog.filter.tag.is_none(), "Any tag")
                    .clicked()
                {
                    catalog.filter.set_tag(None);
                }
                for tag in &tags {
                    let active = catalog.filter.tag.as_deref() == Some(tag.as_str());
                    if ui.selectable_label(active, tag).clicked() {
                        catalog.filter.set_tag(Some(tag.clone()));
                    }
                }
            });
    });

    // Pagination
    let page_size = catalog.filter.page_size.max(1) as u64;
    let total_pages = ((catalog.total + page_size - 1) / page_size).max(1) as u32;
    ui.horizontal(|ui| {
        if ui
            .add_enabled(catalog.filter.page > 1, egui::Button::new("◀"))
            .clicked()
        {
            catalog.filter.page -= 1;
        }
        ui.label(format!("{} / {}", catalog.filter.page, total_pages));
        if ui
            .add_enabled(catalog.filter.page < total_pages, egui::Button::new("▶"))
            .clicked()
        {
            catalog.filter.page += 1;
        }
        if catalog.loading {
            ui.spinner();
        }
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("Upload…").clicked() {
                trigger_file_open(
                    picker,
                    FilePickerContext::PublicModelUpload,
                    FileFilter::single_model(),
                );
            }
        });
    });
    ui.separator();

    let items = catalog.items.clone();
    egui::ScrollArea::vertical()
        .id_salt("public_library_scroll")
        .show(ui, |ui| {
            if items.is_empty() && !catalog.loading {
                ui.label("Nothing here yet.");
            }
            for model in &items {
                ui.horizontal(|ui| {
                    let handle = ui.add(egui::Label::new("≡").sense(egui::Sense::drag()));
                    if handle.drag_started() {
                        drag_state.begin(DragPayload::PublicModel(model.id.clone()));
                    }

                    ui.label(&model.filename);
                    if model.featured {
                        ui.label(egui::RichText::new("★").color(egui::Color32::GOLD));
                    }
                    ui.label(
                        egui::RichText::new(format!("⬇{}", model.download_count))
                            .small()
                            .weak(),
                    );

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("✎").clicked() {
                            forms.admin_open_for = Some(model.id.clone());
                            forms.admin_filename = model.filename.clone();
                            forms.admin_category = model.category.clone();
                            forms.admin_sub_category =
                                model.sub_category.clone().unwrap_or_default();
                            forms.admin_description = model.description.clone();
                            forms.admin_tags = model.tags.join(", ");
                            forms.admin_featured = model.featured;
                        }
                    });
                });

                if forms.admin_open_for.as_deref() == Some(model.id.as_str()) {
                    admin_drawer(
                        ui,
                        model.id.as_str(),
                        catalog,
                        category_state,
                        forms,
                        config,
                        pending_catalog,
                        notices,
                        picker,
                    );
                }
            }
        });
}

/// Inline admin editor for one catalog entry
#[allow(clippy::too_many_arguments)]
fn admin_drawer(
    ui: &mut egui::Ui,
    model_id: &str,
    catalog: &mut PublicCatalog,
    category_state: &mut CategoryState,
    forms: &mut EditorForms,
    config: &ApiConfig,
    pending_catalog: &PendingCatalogPage,
    notices: &PendingNotices,
    picker: &PendingFileResults,
) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        egui::Grid::new(format!("admin_grid_{model_id}"))
            .num_columns(2)
            .show(ui, |ui| {
                ui.label("Filename");
                ui.text_edit_singleline(&mut forms.admin_filename);
                ui.end_row();

                ui.label("Category");
                ui.text_edit_singleline(&mut forms.admin_category);
                ui.end_row();

                ui.label("Sub-category");
                ui.text_edit_singleline(&mut forms.admin_sub_category);
                ui.end_row();

                ui.label("Description");
                ui.text_edit_multiline(&mut forms.admin_description);
                ui.end_row();

                ui.label("Tags");
                ui.text_edit_singleline(&mut forms.admin_tags);
                ui.end_row();

                ui.label("Featured");
                ui.checkbox(&mut forms.admin_featured, "");
                ui.end_row();
            });

        ui.horizontal(|ui| {
            // Required fields gate the save locally
            let valid = !forms.admin_filename.trim().is_empty()
                && !forms.admin_category.trim().is_empty();
            if ui.add_enabled(valid, egui::Button::new("Save")).clicked() {
                let category = forms.admin_category.trim().to_string();
                let sub_category = {
                    let s = forms.admin_sub_category.trim();
                    (!s.is_empty()).then(|| s.to_string())
                };
                // Typed-in categories extend the cached vocabulary until saved
                category_state
                    .index
                    .extend_category(&category, sub_category.as_deref());
                let tags: Vec<String> = forms
                    .admin_tags
                    .split(',')
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect();
                update_public_model(
                    config,
                    model_id,
                    PublicModelUpdate {
                        filename: Some(forms.admin_filename.trim().to_string()),
                        category: Some(category),
                        sub_category,
                        description: Some(forms.admin_description.trim().to_string()),
                        featured: Some(forms.admin_featured),
                        tags: Some(tags),
                    },
                    &catalog.filter,
                    catalog.shelf,
                    pending_catalog,
                    notices,
                );
                forms.admin_open_for = None;
            }
            if ui.button("Preview image…").clicked() {
                trigger_file_open(
                    picker,
                    FilePickerContext::PreviewImage {
                        id: model_id.to_string(),
                        is_public: true,
                    },
                    FileFilter::images(),
                );
            }
            if ui.button("Delete").clicked() {
                delete_public_model(
                    config,
                    model_id,
                    &catalog.filter,
                    catalog.shelf,
                    pending_catalog,
                    notices,
                );
                forms.admin_open_for = None;
            }
            if ui.button("Close").clicked() {
                forms.admin_open_for = None;
            }
        });
    });
}

fn materials_tab(ui: &mut egui::Ui, drag_state: &mut DragState) {
    ui.label("Drag a material onto a placed model to restyle it.");
    ui.separator();
    for definition in BUILTIN_MATERIALS {
        let response = ui.add(
            egui::Label::new(format!("{}  {}", definition.icon, definition.name))
                .sense(egui::Sense::drag()),
        );
        if response.drag_started() {
            drag_state.begin(DragPayload::Material(definition.id.to_string()));
        }
    }
}

/// Floating labels over Gaussian-splat placeholders
fn splat_labels(
    mut contexts: EguiContexts,
    camera_query: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    splats: Query<(&GlobalTransform, &SplatPlaceholder)>,
) {
    let Ok(ctx) = contexts.ctx_mut() else { return };
    let Ok((camera, camera_transform)) = camera_query.single() else {
        return;
    };

    for (transform, splat) in splats.iter() {
        let Ok(pos) = camera.world_to_viewport(camera_transform, transform.translation()) else {
            continue;
        };
        egui::Area::new(egui::Id::new(("splat_label", &splat.label)))
            .fixed_pos([pos.x + 8.0, pos.y - 8.0])
            .show(ctx, |ui| {
                ui.label(egui::RichText::new(&splat.label).small());
            });
    }
}

/// Dispatch picked files to the matching upload
fn process_picked_files(
    picker: Res<PendingFileResults>,
    config: Res<ApiConfig>,
    catalog: Res<PublicCatalog>,
    pending_models: Res<PendingModelList>,
    pending_catalog: Res<PendingCatalogPage>,
    notices: Res<PendingNotices>,
    mut library: ResMut<ModelLibrary>,
) {
    let results = {
        match picker.0.lock() {
            Ok(mut queue) => queue.drain(..).collect::<Vec<_>>(),
            Err(_) => Vec::new(),
        }
    };

    for result in results {
        match result.context {
            FilePickerContext::ModelUpload => {
                if result.files.is_empty() {
                    continue;
                }
                library.loading = true;
                let files = result
                    .files
                    .into_iter()
                    .map(|f| (f.name, f.content))
                    .collect();
                upload_models(&config, files, &pending_models, &notices);
            }
            FilePickerContext::PublicModelUpload => {
                let Some(file) = result.files.into_iter().next() else {
                    continue;
                };
                let category = catalog
                    .filter
                    .category
                    .clone()
                    .unwrap_or_else(|| "uncategorized".to_string());
                upload_public_model(
                    &config,
                    (file.name, file.content),
                    category,
                    &catalog.filter,
                    catalog.shelf,
                    &pending_catalog,
                    &notices,
                );
            }
            FilePickerContext::PreviewImage { id, is_public } => {
                let Some(file) = result.files.into_iter().next() else {
                    continue;
                };
                upload_preview_image(
                    &config,
                    &id,
                    is_public,
                    (file.name, file.content),
                    &notices,
                );
            }
        }
    }
}

/// Capture the viewer canvas and upload it as the scene preview
fn run_scene_preview_capture(
    time: Res<Time>,
    mut capture: ResMut<ScenePreviewCapture>,
    active: Res<ActiveScene>,
    config: Res<ApiConfig>,
    notices: Res<PendingNotices>,
) {
    let Some(ref mut timer) = capture.timer else {
        return;
    };
    timer.tick(time.delta());
    if !timer.just_finished() {
        return;
    }
    capture.timer = None;

    let Some(ref scene_id) = active.id else {
        return;
    };

    #[cfg(target_arch = "wasm32")]
    {
        use base64::Engine;
        use wasm_bindgen::JsCast;

        let Some(canvas) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("geoforge-canvas"))
            .and_then(|e| e.dyn_into::<web_sys::HtmlCanvasElement>().ok())
        else {
            tracing::error!("Viewer canvas not found for capture");
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

        crate::network::upload_scene_preview(&config, scene_id, bytes, &notices);
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = (scene_id, config, notices);
    }
}

/// Refresh the open scene's detail after a placement lands
fn refresh_scene_on_placed(
    mut messages: MessageReader<ModelPlaced>,
    active: Res<ActiveScene>,
    config: Res<ApiConfig>,
    pending_scene: Res<PendingSceneDetail>,
    notices: Res<PendingNotices>,
) {
    for message in messages.read() {
        tracing::debug!("Placed {}, refreshing scene detail", message.name);
        if let Some(ref scene_id) = active.id {
            fetch_scene_detail(&config, scene_id, &pending_scene, &notices);
        }
    }
}
