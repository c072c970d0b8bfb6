mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use app::VaccineExplorerApp;
use config::AppConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let (config, config_error) = match AppConfig::discover() {
        Ok(config) => (config, None),
        Err(e) => {
            log::error!("Invalid configuration, using defaults: {e:#}");
            (AppConfig::default(), Some(format!("Error: {e:#}")))
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Vaccine Explorer – Childhood Vaccination Rates",
        options,
        Box::new(move |cc| {
            // Install image loaders so egui can render the HHS region map.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            let mut app = VaccineExplorerApp::new(config);
            if config_error.is_some() && app.state.status_message.is_none() {
                app.state.status_message = config_error;
            }
            Ok(Box::new(app))
        }),
    )
}
