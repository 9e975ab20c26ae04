//! egui view over a [`Session`].
//!
//! The session lives on the UI thread. File reads and prediction calls run on
//! a tokio runtime and report back through a channel polled every frame.

mod desk;
mod files;
mod settings;

use anyhow::Context;
use desk::{Desk, Event};
use eframe::{App, Frame, egui};
use files::DroppedFile;
use neuroscan_core::config::CONFIG_FILE_NAME;
use neuroscan_core::{
    BatchId, ClientConfig, HttpInferenceClient, InferenceClient, Phase, ResultItem, SampleCatalog,
    Session, decode, read_files,
};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use tokio::runtime::Runtime;

const THUMB_SIZE: u32 = 160;
const POSITIVE_COLOR: egui::Color32 = egui::Color32::from_rgb(230, 80, 90);
const NEGATIVE_COLOR: egui::Color32 = egui::Color32::from_rgb(70, 200, 140);

/// Platform settings file, e.g. `~/.config/neuroscan/neuroscan.toml`.
pub(crate) fn default_config_path() -> Option<PathBuf> {
    directories_next::ProjectDirs::from("org", "neuroscan", "NeuroScan")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Panel {
    Scans,
    Settings,
}

pub(crate) struct UiApp {
    desk: Desk,
    runtime: Runtime,
    client: HttpInferenceClient,
    config: ClientConfig,
    config_path: Option<PathBuf>,
    events_tx: Sender<Event>,
    events_rx: Receiver<Event>,
    panel: Panel,
    drag_active: bool,
    thumbs_batch: Option<BatchId>,
    thumbs: Vec<Option<egui::TextureHandle>>,
    pending_endpoint: String,
    pending_timeout_secs: f64,
    app_version: &'static str,
}

impl UiApp {
    pub(crate) fn new(
        config: ClientConfig,
        config_path: Option<PathBuf>,
        runtime: Runtime,
    ) -> anyhow::Result<Self> {
        let client = HttpInferenceClient::new(&config).context("cannot build HTTP client")?;
        let catalog = SampleCatalog::load(config.sample_dir.as_deref());
        let session = Session::start(catalog, &mut rand::thread_rng());
        let (events_tx, events_rx) = mpsc::channel();
        Ok(Self {
            desk: Desk::new(session),
            runtime,
            client,
            pending_endpoint: config.endpoint.clone(),
            pending_timeout_secs: config.timeout_secs,
            config,
            config_path,
            events_tx,
            events_rx,
            panel: Panel::Scans,
            drag_active: false,
            thumbs_batch: None,
            thumbs: Vec::new(),
            app_version: env!("NEUROSCAN_VERSION"),
        })
    }

    fn poll_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.desk.apply(event);
        }
        self.desk.refresh_status();
    }

    fn spawn_read<F>(&mut self, ctx: &egui::Context, files: Vec<F>)
    where
        F: neuroscan_core::FileHandle + Send + Sync + 'static,
    {
        if files.is_empty() {
            return;
        }
        let tag = self.desk.begin_read(files.len());
        let tx = self.events_tx.clone();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let acquisition = read_files(&files).await;
            if tx.send(Event::FilesRead(tag, acquisition)).is_err() {
                tracing::debug!("view closed before files were read");
            }
            ctx.request_repaint();
        });
    }

    fn request_prediction(&mut self, ctx: &egui::Context) {
        let Some(pending) = self.desk.session.predict_requested() else {
            return;
        };
        self.desk.status.clear();
        let client = self.client.clone();
        let tx = self.events_tx.clone();
        let ctx = ctx.clone();
        self.runtime.spawn(async move {
            let outcome = client.predict(&pending.request).await;
            if tx
                .send(Event::PredictionSettled(pending.tag, outcome))
                .is_err()
            {
                tracing::debug!("view closed before the prediction settled");
            }
            ctx.request_repaint();
        });
    }

    fn handle_drops(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| {
            self.drag_active = !i.raw.hovered_files.is_empty();
            i.raw
                .dropped_files
                .iter()
                .filter_map(DroppedFile::from_egui)
                .collect::<Vec<_>>()
        });
        if !dropped.is_empty() {
            tracing::debug!("{} file(s) dropped", dropped.len());
            self.spawn_read(ctx, dropped);
        }
    }

    fn sync_thumbnails(&mut self, ctx: &egui::Context) {
        let batch = match &self.desk.session.state().batch {
            Some(batch) => batch,
            None => {
                self.thumbs.clear();
                self.thumbs_batch = None;
                return;
            }
        };
        if self.thumbs_batch == Some(batch.id()) {
            return;
        }
        self.thumbs = batch
            .items()
            .iter()
            .enumerate()
            .map(|(idx, item)| load_thumbnail(ctx, idx, item.encoded_payload()))
            .collect();
        self.thumbs_batch = Some(batch.id());
    }

    fn render_toolbar(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        let loading = self.desk.session.state().phase == Phase::Loading;
        ui.horizontal(|ui| {
            if ui.button("Browse images...").clicked() {
                if let Some(files) = files::pick_images() {
                    self.spawn_read(ctx, files);
                }
            }
            if ui.button("New samples").clicked() {
                self.desk.session.sample_requested(&mut rand::thread_rng());
                self.desk.status.clear();
            }
            let can_predict = self.desk.session.can_predict() && !self.desk.is_reading();
            if ui
                .add_enabled(can_predict, egui::Button::new("Predict"))
                .clicked()
            {
                self.request_prediction(ctx);
            }
            ui.separator();
            let (label, target) = match self.panel {
                Panel::Scans => ("Settings", Panel::Settings),
                Panel::Settings => ("Scans", Panel::Scans),
            };
            if ui.add_enabled(!loading, egui::Button::new(label)).clicked() {
                self.panel = target;
            }
            if !loading && self.desk.session.is_in_flight() {
                ui.label("Waiting for the previous request to finish");
            }
            if !self.desk.status.is_empty() {
                ui.label(&self.desk.status);
            }
        });
    }

    fn render_scans(&self, ui: &mut egui::Ui) {
        let state = self.desk.session.state();
        if state.phase == Phase::Loading {
            ui.vertical_centered(|ui| {
                ui.add_space(80.0);
                ui.spinner();
                ui.label("Analyzing brain scans...");
            });
            return;
        }

        let drop_hint = if self.drag_active {
            "Release to analyze these images"
        } else {
            "Drag & drop image(s) here, browse, or try the samples"
        };
        ui.label(drop_hint);
        ui.add_space(6.0);

        let Some(batch) = &state.batch else {
            return;
        };
        if batch.is_empty() {
            ui.heading("None of the selected files could be read");
            return;
        }

        let results = state.results.as_deref();
        egui::ScrollArea::vertical()
            .auto_shrink([false; 2])
            .show(ui, |ui| {
                ui.horizontal_wrapped(|ui| {
                    for (idx, item) in batch.items().iter().enumerate() {
                        let texture = self.thumbs.get(idx).and_then(Option::as_ref);
                        let result = results.and_then(|r| r.get(idx));
                        render_card(ui, item.display_name(), texture, result);
                    }
                });
            });
    }
}

impl App for UiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.poll_events();
        self.handle_drops(ctx);
        self.sync_thumbnails(ctx);

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.heading("Brain Tumor Detector");
            self.render_toolbar(ctx, ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.panel {
            Panel::Scans => self.render_scans(ui),
            Panel::Settings => self.render_settings_panel(ui),
        });
    }
}

fn render_card(
    ui: &mut egui::Ui,
    name: &str,
    texture: Option<&egui::TextureHandle>,
    result: Option<&ResultItem>,
) {
    ui.group(|ui| {
        ui.vertical(|ui| {
            let size = egui::Vec2::splat(THUMB_SIZE as f32);
            let (resp, painter) = ui.allocate_painter(size, egui::Sense::hover());
            let rect = resp.rect;
            match texture {
                Some(tex) => {
                    let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                    painter.image(tex.id(), rect, uv, egui::Color32::WHITE);
                }
                None => {
                    painter.rect_filled(rect, 4.0, egui::Color32::from_gray(40));
                }
            }
            ui.label(name);
            if let Some(result) = result {
                let color = if result.is_positive {
                    POSITIVE_COLOR
                } else {
                    NEGATIVE_COLOR
                };
                ui.label(egui::RichText::new(result.label()).strong().color(color));
                ui.label(format!("Confidence: {}", result.confidence_text()));
            }
        });
    });
}

fn load_thumbnail(ctx: &egui::Context, idx: usize, payload: &str) -> Option<egui::TextureHandle> {
    let decoded = match decode(payload) {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::warn!("cannot decode image {idx}: {e}");
            return None;
        }
    };
    match image::load_from_memory(&decoded.bytes) {
        Ok(img) => {
            let thumb = image::imageops::thumbnail(&img, THUMB_SIZE, THUMB_SIZE);
            let (w, h) = thumb.dimensions();
            let size = [w as usize, h as usize];
            let pixels = thumb.into_raw();
            let color = egui::ColorImage::from_rgba_unmultiplied(size, &pixels);
            Some(ctx.load_texture(format!("scan:{idx}"), color, egui::TextureOptions::LINEAR))
        }
        Err(e) => {
            tracing::warn!("cannot render image {idx}: {e}");
            None
        }
    }
}
