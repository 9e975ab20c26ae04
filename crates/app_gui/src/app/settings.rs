//! Settings panel for the inference endpoint and request timeout.

use super::UiApp;
use eframe::egui;
use neuroscan_core::{ClientConfig, HttpInferenceClient};

impl UiApp {
    /// Renders the settings screen including endpoint, timeout and versions.
    pub(super) fn render_settings_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Settings");
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.label("Inference endpoint");
            ui.add(
                egui::TextEdit::singleline(&mut self.pending_endpoint)
                    .desired_width(420.0)
                    .hint_text(neuroscan_core::config::DEFAULT_ENDPOINT),
            );
        });
        ui.add_space(12.0);
        ui.horizontal(|ui| {
            ui.label("Request timeout");
            ui.add(
                egui::DragValue::new(&mut self.pending_timeout_secs)
                    .range(1.0..=300.0)
                    .speed(1.0)
                    .suffix(" s"),
            );
        });
        ui.add_space(12.0);
        ui.horizontal(|ui| {
            if ui.button("Apply").clicked() {
                self.apply_pending_settings(false);
            }
            let can_save = self.config_path.is_some();
            if ui
                .add_enabled(can_save, egui::Button::new("Apply and save"))
                .clicked()
            {
                self.apply_pending_settings(true);
            }
            if ui.button("Reset").clicked() {
                let defaults = ClientConfig::default();
                self.pending_endpoint = defaults.endpoint;
                self.pending_timeout_secs = defaults.timeout_secs;
            }
        });
        if let Some(path) = &self.config_path {
            ui.label(format!("Settings file: {}", path.display()));
        }

        ui.add_space(16.0);
        ui.separator();
        ui.add_space(6.0);
        ui.heading("Versions");
        ui.label(format!("App version: {}", self.app_version));
        ui.label(format!("Current endpoint: {}", self.client.endpoint()));
        ui.label(format!("Sample scans: {}", self.desk.session.catalog().len()));
        if let Some(dir) = &self.config.sample_dir {
            ui.label(format!("Sample directory: {}", dir.display()));
        }
    }

    fn apply_pending_settings(&mut self, save: bool) {
        let candidate = ClientConfig {
            endpoint: self.pending_endpoint.trim().to_string(),
            timeout_secs: self.pending_timeout_secs,
            ..self.config.clone()
        };
        if let Err(e) = candidate.validate() {
            self.desk.status = format!("Settings not applied: {e}");
            return;
        }
        let client = match HttpInferenceClient::new(&candidate) {
            Ok(client) => client,
            Err(e) => {
                self.desk.status = format!("Settings not applied: {e}");
                return;
            }
        };
        if save {
            if let Some(path) = &self.config_path {
                if let Err(e) = candidate.save(path) {
                    self.desk.status = format!("Could not save settings: {e:#}");
                    return;
                }
            }
        }
        self.client = client;
        self.config = candidate;
        self.desk.status = format!(
            "Using {} ({:.0} s timeout)",
            self.config.endpoint, self.config.timeout_secs
        );
    }
}
