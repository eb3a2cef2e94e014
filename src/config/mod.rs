// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod catalog;
pub mod settings;

pub use catalog::{CatalogError, SignCatalog};
pub use settings::Settings;
