// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Traffic sign detector
//!
//! Turns raw model detections into [`Prediction`] values: filters by the
//! request threshold, builds the bounding box and resolves the class id
//! to an enriched sign record.

use image::DynamicImage;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use super::yolo::{Device, ObjectDetectionModel, RawDetection};
use crate::config::SignCatalog;
use crate::signs::{
    BoundingBox, BoundingBoxError, Normalization, Prediction, PredictionError, SignError, SignInfo,
    SignInfoClient, SignKey, SignRecord,
};

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("Detection model inference failed: {0}")]
    Inference(String),

    #[error("Detection task failed: {0}")]
    TaskFailed(String),

    #[error(transparent)]
    Sign(#[from] SignError),

    #[error(transparent)]
    BoundingBox(#[from] BoundingBoxError),

    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

/// Detects traffic signs and enriches them from the sign info site
#[derive(Clone)]
pub struct TrafficSignDetector {
    model: Arc<dyn ObjectDetectionModel>,
    catalog: Arc<SignCatalog>,
    sign_info: SignInfoClient,
}

impl TrafficSignDetector {
    pub fn new(
        model: Arc<dyn ObjectDetectionModel>,
        catalog: Arc<SignCatalog>,
        sign_info: SignInfoClient,
    ) -> Self {
        Self {
            model,
            catalog,
            sign_info,
        }
    }

    pub fn device(&self) -> Device {
        self.model.device()
    }

    pub fn catalog(&self) -> &SignCatalog {
        &self.catalog
    }

    /// Run detection and keep boxes scoring strictly above `confidence_threshold`
    pub async fn detect(
        &self,
        image: DynamicImage,
        confidence_threshold: f32,
    ) -> Result<Vec<Prediction>, DetectError> {
        let model = Arc::clone(&self.model);
        let detections = tokio::task::spawn_blocking(move || model.infer(&image))
            .await
            .map_err(|e| DetectError::TaskFailed(e.to_string()))?
            .map_err(|e| DetectError::Inference(format!("{:#}", e)))?;

        let kept: Vec<RawDetection> = detections
            .into_iter()
            .filter(|d| d.confidence > confidence_threshold)
            .collect();

        debug!(
            "{} detections above threshold {}",
            kept.len(),
            confidence_threshold
        );

        // One page fetch per distinct sign code, in detection order
        let mut pages: HashMap<String, SignInfo> = HashMap::new();
        let mut predictions = Vec::with_capacity(kept.len());
        for detection in kept {
            let mut sign =
                SignRecord::from_catalog(SignKey::ClassId(detection.class_id), &self.catalog)?;
            let info = match pages.get(&sign.sign_code) {
                Some(info) => info.clone(),
                None => {
                    let info = self.sign_info.lookup(&sign.sign_code).await;
                    pages.insert(sign.sign_code.clone(), info.clone());
                    info
                }
            };
            sign.apply(info);
            predictions.push(to_prediction(detection, sign)?);
        }

        info!("🚦 Detected {} traffic signs", predictions.len());
        Ok(predictions)
    }
}

fn to_prediction(detection: RawDetection, sign: SignRecord) -> Result<Prediction, DetectError> {
    let bbox = BoundingBox::new(
        detection.x,
        detection.y,
        detection.w,
        detection.h,
        Normalization::Infer,
    )?;

    Ok(Prediction::new(detection.confidence, sign, bbox)?)
}
