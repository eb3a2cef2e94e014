// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Driving assistant: detection followed by hint generation

use image::DynamicImage;
use thiserror::Error;
use tracing::info;

use crate::llm::{HintGenerator, LlmError};
use crate::signs::Prediction;
use crate::vision::{DetectError, TrafficSignDetector};

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("Confidence threshold must be between 0 and 1, got {0}")]
    InvalidThreshold(f32),

    #[error(transparent)]
    Detect(#[from] DetectError),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

#[derive(Clone)]
pub struct DrivingAssistant {
    detector: TrafficSignDetector,
    hints: HintGenerator,
}

impl DrivingAssistant {
    pub fn new(detector: TrafficSignDetector, hints: HintGenerator) -> Self {
        Self { detector, hints }
    }

    pub fn detector(&self) -> &TrafficSignDetector {
        &self.detector
    }

    pub fn hints(&self) -> &HintGenerator {
        &self.hints
    }

    /// Detect signs in `image` and return the completion model's hints verbatim.
    ///
    /// The model name is checked before any inference or scraping happens.
    pub async fn predict(
        &self,
        image: DynamicImage,
        confidence_threshold: f32,
        model_name: Option<&str>,
    ) -> Result<String, AssistantError> {
        if !(0.0..=1.0).contains(&confidence_threshold) {
            return Err(AssistantError::InvalidThreshold(confidence_threshold));
        }

        let model = self.hints.resolve_model(model_name)?;

        let predictions: Vec<Prediction> =
            self.detector.detect(image, confidence_threshold).await?;

        info!(
            "Requesting driving hints from {} for {} signs",
            model,
            predictions.len()
        );

        Ok(self.hints.driving_hints(&predictions, Some(model)).await?)
    }
}
