//! Entry point for the Chord Annotator GUI

use std::{error::Error, sync::Arc};

use chord_annotator::{
    app::{AnnotatorApp, RUNTIME},
    config::Config,
    logging,
};
use clap::Parser;
// eframe/egui for GUI application framework
use eframe::egui::Visuals;
use tokio::runtime::Runtime;

/// Program entry point: reads config, initializes logging and the runtime, launches GUI
fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::parse();
    logging::init(&config.log)?;

    // Create a new Tokio runtime and store it globally
    RUNTIME
        .set(Arc::new(Runtime::new()?))
        .map_err(|_| "runtime already initialised")?;

    let app = AnnotatorApp::new(&config)?;
    let light = config.light;

    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Chord Annotator",
        options,
        Box::new(move |cc| {
            let visuals = if light { Visuals::light() } else { Visuals::dark() };
            cc.egui_ctx.set_visuals(visuals);
            Box::new(app)
        }),
    )?;
    Ok(())
}
