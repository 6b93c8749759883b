//! Minimal overlay for the preview route

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};

use crate::app::PreviewState;

pub struct PreviewUiPlugin;

impl Plugin for PreviewUiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(EguiPrimaryContextPass, overlay);
    }
}

fn overlay(mut contexts: EguiContexts, state: Res<PreviewState>) {
    let Ok(ctx) = contexts.ctx_mut() else { return };

    egui::Area::new(egui::Id::new("preview_overlay"))
        .anchor(egui::Align2::LEFT_TOP, [12.0, 12.0])
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                ui.label(egui::RichText::new(&state.model_name).strong());
                if state.loading {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Loading model...");
                    });
                }
                if let Some(ref error) = state.error {
                    ui.colored_label(egui::Color32::from_rgb(200, 90, 80), error);
                }
                if state.captured {
                    ui.label(egui::RichText::new("Preview image captured").small().weak());
                }
            });
        });
}
