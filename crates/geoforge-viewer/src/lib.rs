//! GeoForge Viewer - Standalone model preview
//!
//! A lightweight viewer for a single model, driven by URL query
//! parameters. Used for inspection links and for capturing preview images
//! of assets that have none yet.

mod app;
mod loader;
mod ui;

use wasm_bindgen::prelude::*;

/// WASM entry point
#[wasm_bindgen(start)]
pub fn main() {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging with filtering to reduce noise
    tracing_wasm::set_as_global_default_with_config(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(tracing::Level::WARN)
            .build(),
    );

    // Run the Bevy app
    app::run();
}
