// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use std::{env, sync::Arc};
use tokio::signal;
use traffic_sign_assistant::{
    api::{start_server, AppState},
    config::{Settings, SignCatalog},
    version,
    vision::{ensure_weights, YoloConfig, YoloModel},
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    tracing::info!("🚦 Starting {}", version::get_version_string());

    let settings = Settings::parse();
    settings
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    let addr = settings
        .socket_addr()
        .map_err(|e| anyhow::anyhow!("Invalid listen address: {}", e))?;

    let catalog = SignCatalog::load(&settings.category_mapping_path).with_context(|| {
        format!(
            "Failed to load sign mapping from {} (see config/class_to_sign.example.json for the format)",
            settings.category_mapping_path.display()
        )
    })?;

    let weights = ensure_weights(&settings.weights_path, settings.weights_url.as_deref()).await?;

    let yolo_config = YoloConfig {
        input_width: settings.image_width,
        input_height: settings.image_height,
        ..YoloConfig::default()
    };
    let model = tokio::task::spawn_blocking(move || YoloModel::load(weights, yolo_config))
        .await
        .context("Model loading task failed")??;

    let state = AppState::from_settings(&settings, catalog, Arc::new(model))?;

    start_server(state, addr, async {
        if signal::ctrl_c().await.is_ok() {
            tracing::info!("⏹️  Shutting down...");
        }
    })
    .await?;

    tracing::info!("👋 Goodbye!");
    Ok(())
}
