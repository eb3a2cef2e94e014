// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, warn};

use crate::assistant::AssistantError;
use crate::llm::LlmError;
use crate::vision::ImageError;

/// Error body returned by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    BadRequest(String),
    InternalError(String),
}

impl ApiError {
    pub fn to_response(&self) -> ErrorResponse {
        let detail = match self {
            ApiError::BadRequest(msg) | ApiError::InternalError(msg) => msg.clone(),
        };
        ErrorResponse { detail }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::InternalError(_) => 500,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_response())).into_response()
    }
}

impl From<ImageError> for ApiError {
    fn from(e: ImageError) -> Self {
        warn!("Failed to decode image: {}", e);
        ApiError::BadRequest(format!("Invalid image: {}", e))
    }
}

impl From<AssistantError> for ApiError {
    fn from(e: AssistantError) -> Self {
        match e {
            AssistantError::InvalidThreshold(_)
            | AssistantError::Llm(LlmError::ModelNotAvailable { .. }) => {
                warn!("Rejected prediction request: {}", e);
                ApiError::BadRequest(e.to_string())
            }
            other => {
                error!("Prediction failed: {}", other);
                ApiError::InternalError(other.to_string())
            }
        }
    }
}
