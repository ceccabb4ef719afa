//! Gridview inspector: runs a pipeline configuration and logs a summary of
//! the resulting scene instead of drawing it.
//!
//! Usage:
//! ```text
//! cargo run --example inspect -- path/to/config.json
//! RUST_LOG=gridview=debug cargo run --example inspect -- path/to/config.json
//! ```

use std::convert::Infallible;

use gridview::render::{LabelKind, Renderer, Scene};
use gridview::{GridViewError, Pipeline, PipelineConfig};
use tracing::{error, info};

/// Logs what a drawing backend would receive.
struct SummaryRenderer;

impl Renderer for SummaryRenderer {
    type Error = Infallible;

    fn render(&mut self, scene: &Scene) -> Result<(), Infallible> {
        let fills = scene
            .elements
            .iter()
            .filter(|e| e.color_index.is_some())
            .count();
        info!(
            view = ?scene.view,
            elements = scene.elements.len(),
            filled = fills,
            "Element layer"
        );
        for kind in [LabelKind::Element, LabelKind::Edge, LabelKind::Node] {
            let count = scene.labels_of(kind).count();
            if count > 0 {
                info!(?kind, count, "Label layer");
            }
        }
        if let Some(field) = &scene.field {
            info!(
                nx = field.raster.nx(),
                ny = field.raster.ny(),
                covered = field.raster.data_count(),
                range = ?field.raster.value_range(),
                fill_levels = field.fill_levels,
                "Field layer"
            );
            for &level in &field.contours.levels {
                let polylines = field.contours.for_level(level).count();
                info!(level, polylines, "Iso-lines");
            }
        }
        Ok(())
    }
}

fn run(config_path: &str) -> Result<(), GridViewError> {
    let config = PipelineConfig::from_file(config_path)?;
    let pipeline = Pipeline::new(config)?;
    pipeline.run(&mut SummaryRenderer)?;
    Ok(())
}

fn main() {
    // Default: WARN for everything, INFO for gridview.
    // Override with RUST_LOG env var (e.g. RUST_LOG=gridview=debug).
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("inspect=info".parse().unwrap_or_default())
        .add_directive("gridview=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let Some(config_path) = std::env::args().nth(1) else {
        error!("usage: inspect <config.json>");
        std::process::exit(2);
    };
    if let Err(err) = run(&config_path) {
        error!(%err, "Pipeline failed");
        std::process::exit(1);
    }
}
