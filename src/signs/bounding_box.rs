// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Center-based bounding boxes for detected signs
//!
//! Boxes are stored as (x_center, y_center, width, height) either in pixel
//! space or normalized to [0, 1] against the source image size.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How the coordinates passed to [`BoundingBox::new`] should be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Normalization {
    /// Coordinates are already in [0, 1]
    Normalized,
    /// Coordinates are in pixels
    Pixel,
    /// Decide from the values: normalized when all four are <= 1
    #[default]
    Infer,
}

#[derive(Debug, Error, PartialEq)]
pub enum BoundingBoxError {
    #[error("{field} must be a non-negative number, got {value}")]
    InvalidCoordinate { field: &'static str, value: f32 },

    #[error("image dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: f32, height: f32 },

    #[error("provided width and height ({width}x{height}) do not match the bounding box coordinates")]
    DimensionMismatch { width: f32, height: f32 },
}

/// A detection rectangle in YOLO (x_center, y_center, w, h) format
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    normalized: bool,
}

impl BoundingBox {
    pub fn new(
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        normalization: Normalization,
    ) -> Result<Self, BoundingBoxError> {
        for (field, value) in [("x", x), ("y", y), ("w", w), ("h", h)] {
            if !value.is_finite() || value < 0.0 {
                return Err(BoundingBoxError::InvalidCoordinate { field, value });
            }
        }

        let normalized = match normalization {
            Normalization::Normalized => true,
            Normalization::Pixel => false,
            Normalization::Infer => all_within_unit(x, y, w, h),
        };

        Ok(Self {
            x,
            y,
            w,
            h,
            normalized,
        })
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn w(&self) -> f32 {
        self.w
    }

    pub fn h(&self) -> f32 {
        self.h
    }

    pub fn is_normalized(&self) -> bool {
        self.normalized
    }

    pub fn as_xywh(&self) -> (f32, f32, f32, f32) {
        (self.x, self.y, self.w, self.h)
    }

    /// Corner form (x1, y1, x2, y2) in the box's current coordinate space
    pub fn to_corners(&self) -> (f32, f32, f32, f32) {
        let half_w = self.w / 2.0;
        let half_h = self.h / 2.0;
        (
            self.x - half_w,
            self.y - half_h,
            self.x + half_w,
            self.y + half_h,
        )
    }

    /// Convert pixel coordinates into [0, 1] using the image size.
    ///
    /// x and w are divided by `width`, y and h by `height`. Fails with
    /// [`BoundingBoxError::DimensionMismatch`] when the result falls outside
    /// [0, 1]; the box is left untouched in that case.
    pub fn normalize(&mut self, width: f32, height: f32) -> Result<&mut Self, BoundingBoxError> {
        check_dimensions(width, height)?;

        let x = self.x / width;
        let y = self.y / height;
        let w = self.w / width;
        let h = self.h / height;

        if !all_within_unit(x, y, w, h) {
            return Err(BoundingBoxError::DimensionMismatch { width, height });
        }

        self.x = x;
        self.y = y;
        self.w = w;
        self.h = h;
        self.normalized = true;
        Ok(self)
    }

    /// Convert normalized coordinates back into pixels
    pub fn denormalize(&mut self, width: f32, height: f32) -> Result<&mut Self, BoundingBoxError> {
        check_dimensions(width, height)?;

        self.x *= width;
        self.y *= height;
        self.w *= width;
        self.h *= height;
        self.normalized = false;
        Ok(self)
    }
}

fn all_within_unit(x: f32, y: f32, w: f32, h: f32) -> bool {
    [x, y, w, h].iter().all(|v| *v <= 1.0)
}

fn check_dimensions(width: f32, height: f32) -> Result<(), BoundingBoxError> {
    if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
        Ok(())
    } else {
        Err(BoundingBoxError::InvalidDimensions { width, height })
    }
}
