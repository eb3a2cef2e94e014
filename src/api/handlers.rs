// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP handlers for the assistant endpoints

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use axum_extra::extract::{multipart::MultipartRejection, Multipart};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::errors::ApiError;
use super::http_server::AppState;
use crate::vision::decode_image_bytes;

/// Multipart field carrying the uploaded picture
pub const IMAGE_FIELD: &str = "image";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub llm_models: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassesResponse {
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictParams {
    pub llm_model_name: Option<String>,
    pub confidence_threshold: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub hints: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub device: String,
    pub features: Vec<String>,
}

/// GET /api/available_models
pub async fn available_models_handler(State(state): State<Arc<AppState>>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        llm_models: state.assistant.hints().available_models().to_vec(),
    })
}

/// GET /api/available_classes - unique sign codes, sorted
pub async fn available_classes_handler(
    State(state): State<Arc<AppState>>,
) -> Json<ClassesResponse> {
    Json(ClassesResponse {
        classes: state.assistant.detector().catalog().sign_codes(),
    })
}

/// GET /health
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::version::VERSION_NUMBER.to_string(),
        device: state.assistant.detector().device().to_string(),
        features: crate::version::FEATURES
            .iter()
            .map(|feature| feature.to_string())
            .collect(),
    })
}

/// POST /api/predict - detect signs in an uploaded image and return driving hints
///
/// # Request
/// - multipart field `image` with an `image/*` content type
/// - query `llm_model_name` (optional, defaults to the configured model)
/// - query `confidence_threshold` (optional, defaults to the configured threshold)
///
/// # Errors
/// - 400: image missing, not an image, undecodable, unknown model or bad threshold
/// - 500: detection or completion failure
pub async fn predict_handler(
    State(state): State<Arc<AppState>>,
    params: Result<Query<PredictParams>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let mut multipart = multipart.map_err(|e| {
        debug!("Predict request without multipart body: {}", e);
        ApiError::BadRequest("Image not provided".to_string())
    })?;

    let bytes = read_image_field(&mut multipart).await?;
    let (image, info) = decode_image_bytes(&bytes)?;
    debug!(
        "Decoded upload: {}x{} {:?}, {} bytes",
        info.width, info.height, info.format, info.size_bytes
    );

    let threshold = params
        .confidence_threshold
        .unwrap_or(state.default_confidence_threshold);

    let hints = state
        .assistant
        .predict(image, threshold, requested_model(&params))
        .await?;

    info!("Returned {} chars of driving hints", hints.len());
    Ok(Json(PredictResponse { hints }))
}

/// An empty `llm_model_name` selects the default model
fn requested_model(params: &PredictParams) -> Option<&str> {
    params.llm_model_name.as_deref().filter(|name| !name.is_empty())
}

async fn read_image_field(multipart: &mut Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let content_type = field
            .content_type()
            .map(str::to_string)
            .ok_or_else(|| ApiError::BadRequest("Image not provided".to_string()))?;

        if !content_type.starts_with("image/") {
            warn!("Rejected upload with content type {}", content_type);
            return Err(ApiError::BadRequest("Invalid image type".to_string()));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        return Ok(bytes.to_vec());
    }

    Err(ApiError::BadRequest("Image not provided".to_string()))
}
