use anyhow::Context;
use crim_viewer::app::CrimViewerApp;
use crim_viewer::config::ViewerConfig;
use crim_viewer::data::source::HttpSource;
use crim_viewer::state::AppState;
use eframe::egui;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = ViewerConfig::load().context("loading configuration")?;
    let source = HttpSource::from_config(&config).context("building HTTP client")?;
    let state = AppState::new(config, Box::new(source));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "CRIM Relationship Viewer",
        options,
        Box::new(|_cc| Ok(Box::new(CrimViewerApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("running viewer: {e}"))
}
