// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::{future::Future, net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers::{
    available_classes_handler, available_models_handler, health_handler, predict_handler,
};
use crate::assistant::DrivingAssistant;
use crate::config::{SignCatalog, Settings};
use crate::llm::{HintGenerator, LlmConfig};
use crate::signs::{SignInfoClient, SignInfoConfig};
use crate::vision::image_utils::MAX_IMAGE_SIZE;
use crate::vision::{ObjectDetectionModel, TrafficSignDetector};

/// Headroom for multipart boundaries and headers around the image
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub assistant: DrivingAssistant,
    pub default_confidence_threshold: f32,
}

impl AppState {
    pub fn new(assistant: DrivingAssistant, default_confidence_threshold: f32) -> Self {
        Self {
            assistant,
            default_confidence_threshold,
        }
    }

    /// Wire the assistant from settings around an already loaded model
    pub fn from_settings(
        settings: &Settings,
        catalog: SignCatalog,
        model: Arc<dyn ObjectDetectionModel>,
    ) -> Result<Self> {
        let sign_info = SignInfoClient::new(SignInfoConfig::from(settings))
            .context("Failed to build sign info client")?;
        let hints = HintGenerator::new(LlmConfig::from(settings))
            .context("Failed to build completion client")?;

        let detector = TrafficSignDetector::new(model, Arc::new(catalog), sign_info);
        let assistant = DrivingAssistant::new(detector, hints);

        Ok(Self::new(assistant, settings.confidence_threshold))
    }
}

pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/available_models", get(available_models_handler))
        .route("/api/available_classes", get(available_classes_handler))
        .route("/api/predict", post(predict_handler))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_SIZE + MULTIPART_OVERHEAD))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API until `shutdown` resolves
pub async fn start_server<F>(state: AppState, addr: SocketAddr, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_app(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("🚀 API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("API server failed")?;

    Ok(())
}
