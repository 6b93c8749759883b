//! Reusable file picker system for WASM
//!
//! Provides the file picking used for:
//! - Model upload (one or more GLB/glTF/FBX/OBJ files)
//! - Public catalog upload (admin)
//! - Preview image selection
//!
//! Uses JavaScript interop for native file dialogs in the browser.

use bevy::prelude::*;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub struct FilePickerPlugin;

impl Plugin for FilePickerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PendingFileResults>();
    }
}

/// Context for what the file picker is being used for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilePickerContext {
    /// Uploading models to the user's library
    ModelUpload,
    /// Uploading a model to the public catalog (admin)
    PublicModelUpload,
    /// Selecting a preview image for an asset
    PreviewImage { id: String, is_public: bool },
}

/// File filter for the picker dialog
#[derive(Debug, Clone)]
pub struct FileFilter {
    /// File extensions without dots
    pub extensions: Vec<&'static str>,
    /// Whether multiple files may be picked
    pub multiple: bool,
}

impl FileFilter {
    pub fn models() -> Self {
        Self {
            extensions: vec!["glb", "gltf", "fbx", "obj"],
            multiple: true,
        }
    }

    pub fn single_model() -> Self {
        Self {
            extensions: vec!["glb", "gltf"],
            multiple: false,
        }
    }

    pub fn images() -> Self {
        Self {
            extensions: vec!["png", "jpg", "jpeg", "webp"],
            multiple: false,
        }
    }

    /// Convert to accept string for HTML input element
    pub fn to_accept_string(&self) -> String {
        if self.extensions.is_empty() {
            "*".to_string()
        } else {
            self.extensions
                .iter()
                .map(|ext| format!(".{}", ext))
                .collect::<Vec<_>>()
                .join(",")
        }
    }
}

/// One picked file
#[derive(Debug, Clone)]
pub struct PickedFile {
    pub name: String,
    pub content: Vec<u8>,
}

/// Result from a file picker operation
#[derive(Debug, Clone)]
pub struct FilePickerResult {
    pub context: FilePickerContext,
    pub files: Vec<PickedFile>,
}

/// Pending file results from JavaScript callbacks
#[derive(Resource, Default)]
pub struct PendingFileResults(pub Arc<Mutex<VecDeque<FilePickerResult>>>);

// ============================================================================
// JavaScript Interop (WASM only)
// ============================================================================

#[cfg(target_arch = "wasm32")]
mod js_interop {
    use super::*;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;
    use web_sys::HtmlInputElement;

    /// Open a file picker dialog using a hidden HTML input element
    pub fn open_file_picker(
        filter: &FileFilter,
        pending_results: Arc<Mutex<VecDeque<FilePickerResult>>>,
        context: FilePickerContext,
    ) {
        let accept = filter.to_accept_string();

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            tracing::error!("open_file_picker: no document");
            return;
        };

        let input: HtmlInputElement = match document.create_element("input") {
            Ok(el) => match el.dyn_into::<HtmlInputElement>() {
                Ok(input) => input,
                Err(_) => {
                    tracing::error!("open_file_picker: failed to cast to HtmlInputElement");
                    return;
                }
            },
            Err(e) => {
                tracing::error!("open_file_picker: failed to create input element: {:?}", e);
                return;
            }
        };

        input.set_type("file");
        input.set_accept(&accept);
        input.set_multiple(filter.multiple);
        input.style().set_property("display", "none").ok();

        // Append to body - required for click() to work in many browsers
        let Some(body) = document.body() else {
            tracing::error!("open_file_picker: no document body");
            return;
        };
        if body.append_child(&input).is_err() {
            tracing::error!("open_file_picker: failed to append input to body");
            return;
        }

        let input_clone = input.clone();
        let closure = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            let Some(files) = input_clone.files() else {
                return;
            };

            // Collect every picked file before reporting one batch result
            let total = files.length();
            let collected: Arc<Mutex<Vec<PickedFile>>> = Arc::new(Mutex::new(Vec::new()));

            for i in 0..total {
                let Some(file) = files.get(i) else { continue };
                let filename = file.name();

                let reader = match web_sys::FileReader::new() {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::error!("Failed to create FileReader: {:?}", e);
                        continue;
                    }
                };
                let reader_clone = reader.clone();
                let collected = collected.clone();
                let pending = pending_results.clone();
                let ctx = context.clone();

                let onload = Closure::wrap(Box::new(move |_: web_sys::Event| {
                    let Ok(result) = reader_clone.result() else {
                        return;
                    };
                    let Ok(array_buffer) = result.dyn_into::<js_sys::ArrayBuffer>() else {
                        return;
                    };
                    let content = js_sys::Uint8Array::new(&array_buffer).to_vec();

                    let done = {
                        let Ok(mut list) = collected.lock() else {
                            return;
                        };
                        list.push(PickedFile {
                            name: filename.clone(),
                            content,
                        });
                        list.len() as u32 == total
                    };

                    if done {
                        if let (Ok(mut results), Ok(mut list)) =
                            (pending.lock(), collected.lock())
                        {
                            results.push_back(FilePickerResult {
                                context: ctx.clone(),
                                files: std::mem::take(&mut *list),
                            });
                        }
                    }
                }) as Box<dyn FnMut(_)>);

                reader.set_onload(Some(onload.as_ref().unchecked_ref()));
                onload.forget();
                reader.read_as_array_buffer(&file).ok();
            }

            // Remove the input element
            if let Some(parent) = input_clone.parent_node() {
                parent.remove_child(&input_clone).ok();
            }
        }) as Box<dyn FnMut(_)>);

        input.set_onchange(Some(closure.as_ref().unchecked_ref()));
        closure.forget();

        input.click();
    }
}

// Non-WASM stub
#[cfg(not(target_arch = "wasm32"))]
mod js_interop {
    use super::*;

    pub fn open_file_picker(
        _filter: &FileFilter,
        _pending_results: Arc<Mutex<VecDeque<FilePickerResult>>>,
        _context: FilePickerContext,
    ) {
        tracing::warn!("File picker not supported on this platform");
    }
}

pub use js_interop::open_file_picker;

/// Helper to trigger a file pick from UI
pub fn trigger_file_open(
    pending: &PendingFileResults,
    context: FilePickerContext,
    filter: FileFilter,
) {
    open_file_picker(&filter, pending.0.clone(), context);
}
