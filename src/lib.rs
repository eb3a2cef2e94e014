// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod assistant;
pub mod config;
pub mod llm;
pub mod signs;
pub mod version;
pub mod vision;

// Re-export main types
pub use assistant::{AssistantError, DrivingAssistant};
pub use config::{Settings, SignCatalog};
pub use llm::{HintGenerator, LlmConfig, LlmError};
pub use signs::{BoundingBox, Prediction, SignRecord};
pub use vision::{ObjectDetectionModel, TrafficSignDetector, YoloModel};
