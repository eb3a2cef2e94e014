// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection results
//!
//! A [`Prediction`] owns the box, the confidence and the enriched sign
//! record of one detection. Sign and box fields are reachable directly
//! through accessors, or by name through [`Prediction::attribute`], which
//! looks at the prediction itself, then the sign record, then the box.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::bounding_box::BoundingBox;
use super::traffic_sign::SignRecord;

#[derive(Debug, Error, PartialEq)]
pub enum PredictionError {
    #[error("Confidence score must be between 0 and 1, got {0}")]
    InvalidConfidence(f32),

    #[error("'Prediction' object has no attribute '{0}'")]
    NoSuchAttribute(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    confidence: f32,
    traffic_sign: SignRecord,
    bbox: BoundingBox,
}

impl Prediction {
    pub fn new(
        confidence: f32,
        traffic_sign: SignRecord,
        bbox: BoundingBox,
    ) -> Result<Self, PredictionError> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(PredictionError::InvalidConfidence(confidence));
        }

        Ok(Self {
            confidence,
            traffic_sign,
            bbox,
        })
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn traffic_sign(&self) -> &SignRecord {
        &self.traffic_sign
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn class_id(&self) -> u32 {
        self.traffic_sign.class_id
    }

    pub fn sign_code(&self) -> &str {
        &self.traffic_sign.sign_code
    }

    pub fn name(&self) -> Option<&str> {
        self.traffic_sign.name.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.traffic_sign.category.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.traffic_sign.description.as_deref()
    }

    pub fn sign_image(&self) -> Option<&str> {
        self.traffic_sign.sign_image.as_deref()
    }

    pub fn x(&self) -> f32 {
        self.bbox.x()
    }

    pub fn y(&self) -> f32 {
        self.bbox.y()
    }

    pub fn w(&self) -> f32 {
        self.bbox.w()
    }

    pub fn h(&self) -> f32 {
        self.bbox.h()
    }

    pub fn is_normalized(&self) -> bool {
        self.bbox.is_normalized()
    }

    /// Look up a field by name: own fields first, then the sign record,
    /// then the bounding box.
    pub fn attribute(&self, name: &str) -> Result<Value, PredictionError> {
        [
            serde_json::to_value(self),
            serde_json::to_value(&self.traffic_sign),
            serde_json::to_value(self.bbox),
        ]
        .into_iter()
        .filter_map(Result::ok)
        .find_map(|view| match view {
            Value::Object(mut fields) => fields.remove(name),
            _ => None,
        })
        .ok_or_else(|| PredictionError::NoSuchAttribute(name.to_string()))
    }
}
