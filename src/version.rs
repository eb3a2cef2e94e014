// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the traffic sign assistant

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Capabilities advertised by the health endpoint
pub const FEATURES: &[&str] = &[
    "yolo-onnx-detection",
    "cuda-fallback",
    "sign-enrichment",
    "fireworks-completions",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Traffic Sign Assistant {}", VERSION_NUMBER)
}
