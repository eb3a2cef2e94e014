// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision pipeline for traffic sign detection
//!
//! - `image_utils` - upload decoding and format detection
//! - `preprocessing` - letterbox into the model input tensor
//! - `yolo` - ONNX model session, output decoding and NMS
//! - `detector` - threshold filtering and sign enrichment
//! - `weights` - startup download of the model weights

pub mod detector;
pub mod image_utils;
pub mod preprocessing;
pub mod weights;
pub mod yolo;

pub use detector::{DetectError, TrafficSignDetector};
pub use image_utils::{decode_image_bytes, detect_format, ImageError, ImageInfo};
pub use preprocessing::{preprocess_for_detection, Letterbox};
pub use weights::ensure_weights;
pub use yolo::{Device, ObjectDetectionModel, RawDetection, YoloConfig, YoloModel};
