// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Class id to sign code mapping
//!
//! The detection model emits integer class ids from its training dataset.
//! The mapping file translates them into sign codes of the Ukrainian traffic
//! sign classification, e.g. `{"0": "1.1", "41": "5.1.2"}`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read mapping file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("mapping file is not a JSON object of strings: {0}")]
    Json(#[from] serde_json::Error),

    #[error("mapping key '{0}' is not an integer class id")]
    InvalidClassId(String),

    #[error("mapping file contains no entries")]
    Empty,
}

/// Read-only mapping between model class ids and sign codes
#[derive(Debug, Clone, Default)]
pub struct SignCatalog {
    by_class: BTreeMap<u32, String>,
}

impl SignCatalog {
    /// Load the mapping from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let catalog = Self::from_json(&raw)?;
        info!(
            "Loaded {} sign classes from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let entries: BTreeMap<String, String> = serde_json::from_str(raw)?;
        let by_class = entries
            .into_iter()
            .map(|(key, code)| {
                key.trim()
                    .parse::<u32>()
                    .map(|id| (id, code))
                    .map_err(|_| CatalogError::InvalidClassId(key))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        if by_class.is_empty() {
            return Err(CatalogError::Empty);
        }

        Ok(Self { by_class })
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (u32, S)>,
        S: Into<String>,
    {
        Self {
            by_class: entries
                .into_iter()
                .map(|(id, code)| (id, code.into()))
                .collect(),
        }
    }

    pub fn sign_code(&self, class_id: u32) -> Option<&str> {
        self.by_class.get(&class_id).map(String::as_str)
    }

    /// Lowest class id mapped to `sign_code`
    pub fn class_id(&self, sign_code: &str) -> Option<u32> {
        self.by_class
            .iter()
            .find(|(_, code)| code.as_str() == sign_code)
            .map(|(id, _)| *id)
    }

    /// Unique sign codes known to the model, sorted
    pub fn sign_codes(&self) -> Vec<String> {
        self.by_class
            .values()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_class.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_class.is_empty()
    }
}
