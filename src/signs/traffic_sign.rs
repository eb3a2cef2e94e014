// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Traffic sign records
//!
//! A record is identified by either the model's class id or the sign code
//! from the Ukrainian traffic sign classification; the other half comes from
//! the [`SignCatalog`]. Descriptive fields are filled from the sign info site.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::sign_info::{sign_category, SignInfo, SignInfoClient};
use crate::config::SignCatalog;

/// The identifier a sign record is built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignKey {
    ClassId(u32),
    SignCode(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum SignError {
    #[error("Invalid class ID: {0}")]
    UnknownClassId(u32),

    #[error("Invalid sign code: {0}")]
    UnknownSignCode(String),
}

/// Sign metadata for one detected class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignRecord {
    pub class_id: u32,
    pub sign_code: String,
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub sign_image: Option<String>,
}

impl SignRecord {
    /// Resolve `key` against the catalog without contacting the sign info site
    pub fn from_catalog(key: SignKey, catalog: &SignCatalog) -> Result<Self, SignError> {
        let (class_id, sign_code) = match key {
            SignKey::ClassId(class_id) => {
                let sign_code = catalog
                    .sign_code(class_id)
                    .ok_or(SignError::UnknownClassId(class_id))?;
                (class_id, sign_code.to_string())
            }
            SignKey::SignCode(sign_code) => {
                let class_id = catalog
                    .class_id(&sign_code)
                    .ok_or_else(|| SignError::UnknownSignCode(sign_code.clone()))?;
                (class_id, sign_code)
            }
        };

        Ok(Self {
            class_id,
            sign_code,
            name: None,
            category: None,
            description: None,
            sign_image: None,
        })
    }

    /// Resolve `key` and enrich the record from the sign info site.
    ///
    /// An unknown key fails; an unreachable or incomplete page only leaves
    /// the affected fields unset.
    pub async fn load(
        key: SignKey,
        catalog: &SignCatalog,
        sign_info: &SignInfoClient,
    ) -> Result<Self, SignError> {
        let mut record = Self::from_catalog(key, catalog)?;
        let info = sign_info.lookup(&record.sign_code).await;
        record.apply(info);
        Ok(record)
    }

    pub fn apply(&mut self, info: SignInfo) {
        self.name = info.name;
        self.category = info.category;
        self.description = info.description;
        self.sign_image = info.image_url;
    }

    /// Coarse category code, e.g. `5` for `5.1.2`
    pub fn category_code(&self) -> &str {
        sign_category(&self.sign_code)
    }
}
