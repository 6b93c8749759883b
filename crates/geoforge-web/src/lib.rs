//! GeoForge Web - Browser-based 3D scene editor and asset library
//!
//! This crate provides the editor application: asset browsing and upload,
//! drag-and-drop placement onto the geographic viewer, and scene-instance
//! loading against the backend REST API.

mod app;
mod dragdrop;
mod file_picker;
mod network;
mod scene_load;
mod ui;

use wasm_bindgen::prelude::*;

/// Entry point for WASM module
#[wasm_bindgen(start)]
pub fn main() {
    // Set panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging with filtering to reduce wgpu noise
    tracing_wasm::set_as_global_default_with_config(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(tracing::Level::WARN)
            .build(),
    );

    // Run the Bevy app
    app::run();
}
