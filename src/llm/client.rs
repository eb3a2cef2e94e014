// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Fireworks completion client for driving hints

use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use super::prompts::{format_signs, render_prompt, MAIN_PROMPT_TEMPLATE};
use crate::config::settings::{DEFAULT_FIREWORKS_BASE_URL, DEFAULT_LLM};
use crate::config::Settings;
use crate::signs::Prediction;

/// Account prefix for serverless models on Fireworks
const MODEL_PREFIX: &str = "accounts/fireworks/models/";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Provided model name {model} is not supported. Please choose from {available:?}")]
    ModelNotAvailable {
        model: String,
        available: Vec<String>,
    },

    #[error("Completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Completion API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Completion API returned no choices")]
    EmptyCompletion,
}

// --- Fireworks completion serde structs ---

#[derive(serde::Serialize)]
struct CompletionRequest<'a> {
    model: String,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
}

#[derive(serde::Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
    usage: Option<CompletionUsage>,
}

#[derive(serde::Deserialize)]
struct CompletionChoice {
    text: String,
}

#[derive(serde::Deserialize)]
struct CompletionUsage {
    total_tokens: u32,
}

/// Completion settings
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub available_models: Vec<String>,
    pub default_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
    pub prompt_template: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        let settings = Settings::default();
        Self {
            api_key: String::new(),
            base_url: DEFAULT_FIREWORKS_BASE_URL.to_string(),
            available_models: settings.available_llms.clone(),
            default_model: DEFAULT_LLM.to_string(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            timeout: settings.llm_timeout(),
            prompt_template: MAIN_PROMPT_TEMPLATE.to_string(),
        }
    }
}

impl From<&Settings> for LlmConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            api_key: settings.fireworks_api_key.clone(),
            base_url: settings.fireworks_base_url.clone(),
            available_models: settings.available_llms.clone(),
            default_model: settings.default_llm.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            timeout: settings.llm_timeout(),
            prompt_template: MAIN_PROMPT_TEMPLATE.to_string(),
        }
    }
}

/// Generates driving hints for detected signs with a hosted completion model
#[derive(Debug, Clone)]
pub struct HintGenerator {
    client: Client,
    endpoint: String,
    config: LlmConfig,
}

impl HintGenerator {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(config.timeout).build()?;

        let endpoint = format!("{}/completions", config.base_url.trim_end_matches('/'));
        info!(
            "Completion client configured: endpoint={}, default model={}",
            endpoint, config.default_model
        );

        Ok(Self {
            client,
            endpoint,
            config,
        })
    }

    pub fn available_models(&self) -> &[String] {
        &self.config.available_models
    }

    /// Pick the requested model, or the default, and check it is allowed
    pub fn resolve_model<'a>(&'a self, requested: Option<&'a str>) -> Result<&'a str, LlmError> {
        let model = requested.unwrap_or(&self.config.default_model);

        if self.config.available_models.iter().any(|m| m == model) {
            Ok(model)
        } else {
            Err(LlmError::ModelNotAvailable {
                model: model.to_string(),
                available: self.config.available_models.clone(),
            })
        }
    }

    /// Build the full prompt for a list of detections
    pub fn build_prompt(&self, predictions: &[Prediction]) -> String {
        render_prompt(&self.config.prompt_template, &format_signs(predictions))
    }

    /// Ask `model` for driving hints about `predictions`.
    ///
    /// The request is sent even when nothing was detected; the prompt
    /// tells the model how to answer in that case.
    pub async fn driving_hints(
        &self,
        predictions: &[Prediction],
        model: Option<&str>,
    ) -> Result<String, LlmError> {
        let model = self.resolve_model(model)?;
        let prompt = self.build_prompt(predictions);
        self.complete(model, &prompt).await
    }

    /// Send one completion request and return the generated text verbatim
    pub async fn complete(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        let start = std::time::Instant::now();

        let request = CompletionRequest {
            model: format!("{}{}", MODEL_PREFIX, model),
            prompt,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: CompletionResponse = response.json().await?;
        let tokens_used = completion.usage.map(|u| u.total_tokens).unwrap_or(0);
        let text = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or(LlmError::EmptyCompletion)?;

        debug!(
            "Completion from {} in {}ms ({} tokens)",
            model,
            start.elapsed().as_millis(),
            tokens_used
        );

        Ok(text)
    }
}
