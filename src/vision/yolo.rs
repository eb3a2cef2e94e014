// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLO traffic sign detection model
//!
//! Runs a YOLO model exported to ONNX. The output tensor has shape
//! `[1, 4 + num_classes, anchors]` with (cx, cy, w, h) followed by one score
//! per class for every anchor.

use anyhow::{Context, Result};
use image::DynamicImage;
use ndarray::{ArrayViewD, Axis, Ix2};
use ort::execution_providers::{
    CPUExecutionProvider, CUDAExecutionProvider, ExecutionProviderDispatch,
};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::fmt;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, warn};

use super::preprocessing::{preprocess_for_detection, Letterbox};

/// A single model detection in original image pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawDetection {
    pub class_id: u32,
    pub confidence: f32,
    /// Center x
    pub x: f32,
    /// Center y
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl RawDetection {
    fn corners(&self) -> (f32, f32, f32, f32) {
        (
            self.x - self.w / 2.0,
            self.y - self.h / 2.0,
            self.x + self.w / 2.0,
            self.y + self.h / 2.0,
        )
    }

    /// Intersection over union with another detection
    pub fn iou(&self, other: &Self) -> f32 {
        let (ax1, ay1, ax2, ay2) = self.corners();
        let (bx1, by1, bx2, by2) = other.corners();

        let inter_w = (ax2.min(bx2) - ax1.max(bx1)).max(0.0);
        let inter_h = (ay2.min(by2) - ay1.max(by1)).max(0.0);
        let intersection = inter_w * inter_h;
        let union = self.w * self.h + other.w * other.h - intersection;

        if union <= 0.0 {
            0.0
        } else {
            intersection / union
        }
    }
}

/// Defines what the sign detector needs from a detection model.
///
/// Implementations return every candidate the model keeps after its own
/// post-processing; confidence filtering for a request happens in the
/// detector.
pub trait ObjectDetectionModel: Send + Sync {
    fn infer(&self, image: &DynamicImage) -> Result<Vec<RawDetection>>;

    fn device(&self) -> Device {
        Device::Cpu
    }
}

/// Compute device selected when the model was loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cuda,
    Cpu,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cuda => write!(f, "cuda"),
            Device::Cpu => write!(f, "cpu"),
        }
    }
}

/// Post-processing parameters, mirroring the detection library defaults
#[derive(Debug, Clone)]
pub struct YoloConfig {
    pub input_width: u32,
    pub input_height: u32,
    /// Candidates at or below this score are dropped before NMS
    pub candidate_confidence: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
}

impl YoloConfig {
    /// Anchor count of a stride 8/16/32 detection head at this input size
    pub fn anchor_count(&self) -> usize {
        [8, 16, 32]
            .iter()
            .map(|stride| {
                (self.input_width.div_ceil(*stride) * self.input_height.div_ceil(*stride)) as usize
            })
            .sum()
    }
}

impl Default for YoloConfig {
    fn default() -> Self {
        Self {
            input_width: 640,
            input_height: 640,
            candidate_confidence: 0.25,
            iou_threshold: 0.7,
            max_detections: 300,
        }
    }
}

/// YOLO model backed by an ONNX Runtime session
pub struct YoloModel {
    session: Mutex<Session>,
    input_name: String,
    device: Device,
    config: YoloConfig,
}

impl fmt::Debug for YoloModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("YoloModel")
            .field("input_name", &self.input_name)
            .field("device", &self.device)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl YoloModel {
    /// Load the model, preferring CUDA and falling back to CPU.
    ///
    /// The device is fixed for the lifetime of the model.
    pub fn load<P: AsRef<Path>>(model_path: P, config: YoloConfig) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("Detection model not found: {}", model_path.display());
        }

        info!("Loading detection model from {}", model_path.display());

        // Try CUDA first, fall back to CPU if unavailable
        let cuda = CUDAExecutionProvider::default().build().error_on_failure();
        let (session, device) = match build_session(model_path, cuda) {
            Ok(session) => (session, Device::Cuda),
            Err(e) => {
                warn!("⚠️  CUDA execution provider failed: {:#}", e);
                warn!("   Falling back to CPU execution provider");
                let cpu = CPUExecutionProvider::default().build();
                (build_session(model_path, cpu)?, Device::Cpu)
            }
        };

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());

        info!("✅ Detection model loaded (device: {})", device);

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            device,
            config,
        })
    }

}

fn build_session(model_path: &Path, provider: ExecutionProviderDispatch) -> Result<Session> {
    Session::builder()
        .context("Failed to create session builder")?
        .with_execution_providers([provider])
        .context("Failed to set execution provider")?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .context("Failed to set optimization level")?
        .commit_from_file(model_path)
        .with_context(|| format!("Failed to load detection model from {}", model_path.display()))
}

impl ObjectDetectionModel for YoloModel {
    fn infer(&self, image: &DynamicImage) -> Result<Vec<RawDetection>> {
        let (input, letterbox) =
            preprocess_for_detection(image, self.config.input_width, self.config.input_height);

        let input_value = Value::from_array(input).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Detection session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .context("Detection inference failed")?;

        let output = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        debug!("Detection output shape: {:?}", output.shape());

        let candidates = decode_output(
            output,
            &letterbox,
            self.config.anchor_count(),
            self.config.candidate_confidence,
        )?;
        let mut detections = non_max_suppression(candidates, self.config.iou_threshold);
        detections.truncate(self.config.max_detections);

        debug!("Model kept {} detections", detections.len());
        Ok(detections)
    }

    fn device(&self) -> Device {
        self.device
    }
}

/// Decode a raw `[1, 4 + nc, anchors]` tensor into candidate detections.
///
/// A transposed `[1, anchors, 4 + nc]` layout is accepted as well. The
/// anchor axis is the one whose length equals `anchors`.
pub fn decode_output(
    output: ArrayViewD<f32>,
    letterbox: &Letterbox,
    anchors: usize,
    candidate_confidence: f32,
) -> Result<Vec<RawDetection>> {
    let shape = output.shape().to_vec();
    if shape.len() != 3 || shape[0] != 1 {
        anyhow::bail!("Unexpected detection output shape: {:?}", shape);
    }

    let predictions = output
        .index_axis(Axis(0), 0)
        .into_dimensionality::<Ix2>()
        .context("Detection output is not two dimensional")?;

    let predictions = if predictions.ncols() == anchors {
        predictions
    } else if predictions.nrows() == anchors {
        predictions.reversed_axes()
    } else {
        anyhow::bail!(
            "Detection output {:?} does not match {} anchors for the configured input size",
            shape,
            anchors
        );
    };

    if predictions.nrows() <= 4 {
        anyhow::bail!("Detection output has no class scores: {:?}", shape);
    }

    let mut candidates = Vec::new();
    for anchor in predictions.axis_iter(Axis(1)) {
        let best = anchor
            .iter()
            .skip(4)
            .copied()
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (class, score)| match best {
                Some((_, best_score)) if best_score >= score => best,
                _ => Some((class, score)),
            });

        let Some((class_id, confidence)) = best else {
            continue;
        };
        if confidence <= candidate_confidence {
            continue;
        }

        let (x, y, w, h) = letterbox.map_to_original(anchor[0], anchor[1], anchor[2], anchor[3]);
        candidates.push(RawDetection {
            class_id: class_id as u32,
            confidence,
            x,
            y,
            w,
            h,
        });
    }

    Ok(candidates)
}

/// Class-aware greedy non-maximum suppression, highest confidence first
pub fn non_max_suppression(mut candidates: Vec<RawDetection>, iou_threshold: f32) -> Vec<RawDetection> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<RawDetection> = Vec::new();
    for candidate in candidates {
        let suppressed = kept.iter().any(|k| {
            k.class_id == candidate.class_id && k.iou(&candidate) > iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}
