//! Supersampling viewer.
//!
//! Renders an aliasing-prone test pattern through the oversample pipeline.
//! `F5` reloads `oversample.toml` and the scene, `Ctrl+T` captures the
//! composite targets (when dumping is enabled), `Esc` quits.

mod app;
mod host;
mod renderer;
mod scene;

use std::path::PathBuf;

use anyhow::{Context, Result};

use oversample_core::OversampleConfig;
use oversample_engine::device::GpuInit;
use oversample_engine::logging::{init_logging, LoggingConfig};
use oversample_engine::window::{Runtime, RuntimeConfig};

use app::ViewerApp;

const CONFIG_FILE: &str = "oversample.toml";

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config_path = PathBuf::from(CONFIG_FILE);
    let config = OversampleConfig::load_or_create(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    config.log_summary();

    let runtime = RuntimeConfig {
        title: "oversample viewer".to_string(),
        ..RuntimeConfig::default()
    };

    Runtime::run(runtime, GpuInit::default(), ViewerApp::new(config_path, config))
}
