// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Sign info page fetching
//!
//! Looks up a sign on the sign-info site and scrapes its description,
//! category, name and picture. Enrichment is best effort: a failed fetch or
//! a non-success status yields an empty [`SignInfo`], never an error.

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use super::extractor::{extract_sign_page, SignPage};
use crate::config::settings::{DEFAULT_SIGN_IMAGE_URL_TEMPLATE, DEFAULT_SIGN_INFO_URL_TEMPLATE};
use crate::config::Settings;

/// Configuration for sign info lookups
#[derive(Debug, Clone)]
pub struct SignInfoConfig {
    /// Page URL template with `{category}` and `{sign_code}` placeholders
    pub info_url_template: String,
    /// Picture URL template with an `{image_source}` placeholder
    pub image_url_template: String,
    pub timeout: Duration,
}

impl Default for SignInfoConfig {
    fn default() -> Self {
        Self {
            info_url_template: DEFAULT_SIGN_INFO_URL_TEMPLATE.to_string(),
            image_url_template: DEFAULT_SIGN_IMAGE_URL_TEMPLATE.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl From<&Settings> for SignInfoConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            info_url_template: settings.sign_info_url_template.clone(),
            image_url_template: settings.sign_image_url_template.clone(),
            timeout: settings.sign_info_timeout(),
        }
    }
}

/// Scraped sign details with the picture resolved to a full URL
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignInfo {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// HTTP client for the sign info site
#[derive(Debug, Clone)]
pub struct SignInfoClient {
    client: Client,
    config: SignInfoConfig,
}

impl SignInfoClient {
    pub fn new(config: SignInfoConfig) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent("Mozilla/5.0 (compatible; TrafficSignAssistant/0.1)")
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client, config })
    }

    /// Page URL for a sign code
    pub fn info_url(&self, sign_code: &str) -> String {
        self.config
            .info_url_template
            .replace("{category}", sign_category(sign_code))
            .replace("{sign_code}", sign_code)
    }

    pub fn image_url(&self, image_source: &str) -> String {
        self.config
            .image_url_template
            .replace("{image_source}", image_source)
    }

    /// Fetch and scrape the page for `sign_code`
    pub async fn lookup(&self, sign_code: &str) -> SignInfo {
        let url = self.info_url(sign_code);
        debug!("Fetching sign info from: {}", url);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Sign info request failed for {}: {}", sign_code, e);
                return SignInfo::default();
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!("Sign info page returned HTTP {} for: {}", status.as_u16(), url);
            return SignInfo::default();
        }

        let html = match response.text().await {
            Ok(html) => html,
            Err(e) => {
                warn!("Failed to read sign info page {}: {}", url, e);
                return SignInfo::default();
            }
        };

        let page = extract_sign_page(&html);
        debug!("Scraped sign {}: {:?}", sign_code, page);
        self.resolve(page)
    }

    fn resolve(&self, page: SignPage) -> SignInfo {
        SignInfo {
            name: page.name,
            category: page.category,
            description: page.description,
            image_url: page.image_source.map(|source| self.image_url(&source)),
        }
    }
}

/// Coarse category of a sign code: the part before the first `.`
pub fn sign_category(sign_code: &str) -> &str {
    sign_code.split('.').next().unwrap_or(sign_code)
}
