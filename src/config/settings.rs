// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration
//!
//! Every field can be set with a CLI flag or an environment variable.
//! `main` loads a `.env` file first, so local overrides live there.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Completion models served by the Fireworks API that the assistant accepts
pub const DEFAULT_AVAILABLE_LLMS: &[&str] = &[
    "llama-v3p1-405b-instruct",
    "llama-v3p1-70b-instruct",
    "llama-v3p1-8b-instruct",
    "llama-v3-70b-instruct",
    "mixtral-8x22b-instruct",
    "mixtral-8x7b-instruct",
];

pub const DEFAULT_LLM: &str = "llama-v3p1-405b-instruct";

pub const DEFAULT_SIGN_INFO_URL_TEMPLATE: &str = "https://vodiy.ua/znaky/{category}/{sign_code}";
pub const DEFAULT_SIGN_IMAGE_URL_TEMPLATE: &str = "https://vodiy.ua/{image_source}";
pub const DEFAULT_FIREWORKS_BASE_URL: &str = "https://api.fireworks.ai/inference/v1";

/// Traffic sign driving assistant
#[derive(Parser, Debug, Clone)]
#[command(name = "traffic-sign-assistant")]
#[command(about = "Detects traffic signs in images and turns them into driving hints", long_about = None)]
pub struct Settings {
    /// Path to the ONNX detection weights
    #[arg(
        long,
        env = "OBJ_DETECT_WEIGHTS_PATH",
        default_value = "weights/traffic_signs_detection.onnx"
    )]
    pub weights_path: PathBuf,

    /// Where to fetch the weights from when the file is missing
    #[arg(long, env = "OBJ_DETECT_WEIGHTS_URL")]
    pub weights_url: Option<String>,

    /// JSON file mapping class ids to sign codes
    #[arg(
        long,
        env = "CATEGORY_MAPPING_PATH",
        default_value = "config/class_to_sign.json"
    )]
    pub category_mapping_path: PathBuf,

    /// Default confidence threshold for detections
    #[arg(long, env = "CONFIDENCE_THRESHOLD", default_value_t = 0.5)]
    pub confidence_threshold: f32,

    /// Maximum number of tokens to generate
    #[arg(long, env = "MAX_TOKENS", default_value_t = 100)]
    pub max_tokens: u32,

    /// Sampling temperature for completion generation
    #[arg(long, env = "TEMPERATURE", default_value_t = 0.0)]
    pub temperature: f32,

    /// Model input width
    #[arg(long, env = "IMAGE_WIDTH", default_value_t = 640)]
    pub image_width: u32,

    /// Model input height
    #[arg(long, env = "IMAGE_HEIGHT", default_value_t = 640)]
    pub image_height: u32,

    #[arg(long, env = "API_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "API_PORT", default_value_t = 8000)]
    pub port: u16,

    /// API key for the Fireworks completion API
    #[arg(long, env = "FIREWORKS_API_KEY", hide_env_values = true)]
    pub fireworks_api_key: String,

    #[arg(long, env = "FIREWORKS_BASE_URL", default_value = DEFAULT_FIREWORKS_BASE_URL)]
    pub fireworks_base_url: String,

    /// Comma separated allow-list of completion models
    #[arg(
        long,
        env = "AVAILABLE_LLMS",
        value_delimiter = ',',
        default_values_t = DEFAULT_AVAILABLE_LLMS.iter().map(|m| m.to_string()).collect::<Vec<_>>()
    )]
    pub available_llms: Vec<String>,

    /// Model used when a request does not name one
    #[arg(long, env = "DEFAULT_LLM", default_value = DEFAULT_LLM)]
    pub default_llm: String,

    #[arg(long, env = "SIGN_INFO_URL_TEMPLATE", default_value = DEFAULT_SIGN_INFO_URL_TEMPLATE)]
    pub sign_info_url_template: String,

    #[arg(long, env = "SIGN_IMAGE_URL_TEMPLATE", default_value = DEFAULT_SIGN_IMAGE_URL_TEMPLATE)]
    pub sign_image_url_template: String,

    /// Timeout for sign info page fetches, in seconds
    #[arg(long, env = "SIGN_INFO_TIMEOUT_SECS", default_value_t = 10)]
    pub sign_info_timeout_secs: u64,

    /// Timeout for completion requests, in seconds
    #[arg(long, env = "LLM_TIMEOUT_SECS", default_value_t = 60)]
    pub llm_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            weights_path: PathBuf::from("weights/traffic_signs_detection.onnx"),
            weights_url: None,
            category_mapping_path: PathBuf::from("config/class_to_sign.json"),
            confidence_threshold: 0.5,
            max_tokens: 100,
            temperature: 0.0,
            image_width: 640,
            image_height: 640,
            host: "0.0.0.0".to_string(),
            port: 8000,
            fireworks_api_key: String::new(),
            fireworks_base_url: DEFAULT_FIREWORKS_BASE_URL.to_string(),
            available_llms: DEFAULT_AVAILABLE_LLMS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            default_llm: DEFAULT_LLM.to_string(),
            sign_info_url_template: DEFAULT_SIGN_INFO_URL_TEMPLATE.to_string(),
            sign_image_url_template: DEFAULT_SIGN_IMAGE_URL_TEMPLATE.to_string(),
            sign_info_timeout_secs: 10,
            llm_timeout_secs: 60,
        }
    }
}

impl Settings {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(format!(
                "CONFIDENCE_THRESHOLD must be within [0, 1], got {}",
                self.confidence_threshold
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!(
                "TEMPERATURE must be within [0, 2], got {}",
                self.temperature
            ));
        }
        if self.max_tokens == 0 {
            return Err("MAX_TOKENS must be at least 1".to_string());
        }
        let dims = [self.image_width, self.image_height];
        if dims.iter().any(|d| *d == 0 || d % 32 != 0) {
            return Err(format!(
                "IMAGE_WIDTH and IMAGE_HEIGHT must be positive multiples of 32, got {}x{}",
                self.image_width, self.image_height
            ));
        }
        if self.available_llms.is_empty() {
            return Err("AVAILABLE_LLMS must list at least one model".to_string());
        }
        if !self.available_llms.contains(&self.default_llm) {
            return Err(format!(
                "DEFAULT_LLM '{}' is not in AVAILABLE_LLMS {:?}",
                self.default_llm, self.available_llms
            ));
        }
        for placeholder in ["{category}", "{sign_code}"] {
            if !self.sign_info_url_template.contains(placeholder) {
                return Err(format!(
                    "SIGN_INFO_URL_TEMPLATE must contain {}",
                    placeholder
                ));
            }
        }
        if !self.sign_image_url_template.contains("{image_source}") {
            return Err("SIGN_IMAGE_URL_TEMPLATE must contain {image_source}".to_string());
        }
        if url::Url::parse(&self.fireworks_base_url).is_err() {
            return Err(format!(
                "FIREWORKS_BASE_URL is not a valid URL: {}",
                self.fireworks_base_url
            ));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| format!("invalid API_HOST/API_PORT: {}", e))
    }

    pub fn sign_info_timeout(&self) -> Duration {
        Duration::from_secs(self.sign_info_timeout_secs)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }
}
