//! WSI Pyramid - Generate tile pyramids from large images.
//!
//! This binary decodes the input image, builds the requested pyramid and
//! writes it to the chosen container.

use clap::Parser;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wsi_pyramid::{
    config::{Config, LayoutKind},
    layout::{DeepZoomLayout, GenericLayout, NamingStrategy, ZoomifyLayout},
    slide::ImageRegionReader,
    tile::{DumpSummary, TilePyramidGenerator},
    PyramidError,
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(&config).await {
        Ok(summary) => {
            info!(
                "Wrote {} tiles over {} levels to {} in {:.1}s",
                summary.tiles_written,
                summary.level_count,
                config.output.display(),
                summary.elapsed.as_secs_f64()
            );
            ExitCode::SUCCESS
        }
        Err(PyramidError::Cancelled { written }) => {
            warn!("Interrupted after {} tiles; output is incomplete", written);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Pyramid Command
// =============================================================================

async fn run(config: &Config) -> Result<DumpSummary, PyramidError> {
    let cancel = Arc::new(AtomicBool::new(false));
    let options = config
        .dump_options()?
        .with_cancel_flag(Arc::clone(&cancel));

    // Stop between tiles on Ctrl-C
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current tile");
            cancel.store(true, Ordering::Relaxed);
        }
    });

    info!("Reading {}", config.input.display());
    let input = config.input.clone();
    let reader = tokio::task::spawn_blocking(move || ImageRegionReader::open(input)).await??;

    match config.layout {
        LayoutKind::Deepzoom => {
            let params = config.tile_params(DeepZoomLayout.default_params());
            let generator = TilePyramidGenerator::new(reader, DeepZoomLayout, params)?;
            let summary = generator.dump(&config.output, &options).await?;

            if let Some(path) = &config.descriptor {
                let descriptor = generator
                    .dzi_document("jpg")
                    .render(config.descriptor_format)?;
                tokio::fs::write(path, descriptor).await?;
                info!("Wrote {} descriptor to {}", config.descriptor_format, path.display());
            }
            Ok(summary)
        }
        LayoutKind::Zoomify => {
            let params = config.tile_params(ZoomifyLayout.default_params());
            let generator = TilePyramidGenerator::new(reader, ZoomifyLayout, params)?;
            generator.dump(&config.output, &options).await
        }
        LayoutKind::Generic => Err(PyramidError::PathsUnavailable {
            layout: GenericLayout.name(),
        }),
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Initialize the tracing subscriber for logging.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "wsi_pyramid=debug"
    } else {
        "wsi_pyramid=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
