// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Traffic sign data model
//!
//! - `bounding_box` - detection rectangles and normalization
//! - `traffic_sign` - sign records resolved through the class mapping
//! - `sign_info` / `extractor` - enrichment from the sign info site
//! - `prediction` - one detection: box + confidence + sign record

pub mod bounding_box;
pub mod extractor;
pub mod prediction;
pub mod sign_info;
pub mod traffic_sign;

pub use bounding_box::{BoundingBox, BoundingBoxError, Normalization};
pub use prediction::{Prediction, PredictionError};
pub use sign_info::{SignInfo, SignInfoClient, SignInfoConfig};
pub use traffic_sign::{SignError, SignKey, SignRecord};
