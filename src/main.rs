mod annotation;
mod app;
mod canvas;
mod clipboard;
mod color;
mod document;
mod flatten;
mod geometry;
mod interaction;
mod loader;
mod sidebar;
mod state;
mod toolbar;

use eframe::egui;
use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("planmark=info")),
        )
        .init();

    let viewport = egui::ViewportBuilder::default()
        .with_title("PlanMark")
        .with_inner_size([1200.0, 800.0])
        .with_min_inner_size([720.0, 520.0]);

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "PlanMark",
        options,
        Box::new(|cc| Box::new(app::PlanMarkApp::new(cc))),
    )
}
