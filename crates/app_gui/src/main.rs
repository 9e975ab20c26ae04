mod app;

use anyhow::Context;
use app::UiApp;
use eframe::NativeOptions;
use neuroscan_core::ClientConfig;
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    // An explicit settings file may be passed as the only argument.
    let config_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(app::default_config_path);
    let config = ClientConfig::load(config_path.as_deref()).context("cannot load settings")?;
    tracing::info!("inference endpoint: {}", config.endpoint);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .context("cannot start I/O runtime")?;
    let app = UiApp::new(config, config_path, runtime)?;

    eframe::run_native(
        "NeuroScan",
        NativeOptions::default(),
        Box::new(move |_cc| Ok(Box::new(app))),
    )
    .map_err(|e| anyhow::anyhow!("application stopped with error: {e}"))
}
