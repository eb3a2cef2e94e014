// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Loading the class id mapping from disk

use std::io::Write;
use tempfile::NamedTempFile;
use traffic_sign_assistant::config::{CatalogError, SignCatalog};

fn mapping_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_mapping_file() {
    let file = mapping_file(r#"{"0": "1.1", "7": "3.21", "8": "3.21"}"#);
    let catalog = SignCatalog::load(file.path()).unwrap();

    assert_eq!(catalog.len(), 3);
    assert_eq!(catalog.sign_code(0), Some("1.1"));
    assert_eq!(catalog.class_id("3.21"), Some(7));
    assert_eq!(catalog.sign_codes(), vec!["1.1", "3.21"]);
}

#[test]
fn test_load_example_mapping() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/class_to_sign.example.json");
    let catalog = SignCatalog::load(path).unwrap();
    assert!(!catalog.is_empty());
    assert_eq!(catalog.sign_code(0), Some("1.1"));
}

#[test]
fn test_missing_file() {
    let err = SignCatalog::load("/nonexistent/class_to_sign.json").unwrap_err();
    assert!(matches!(err, CatalogError::Io { .. }));
}

#[test]
fn test_non_integer_key() {
    let file = mapping_file(r#"{"stop": "2.2"}"#);
    let err = SignCatalog::load(file.path()).unwrap_err();
    assert!(matches!(err, CatalogError::InvalidClassId(key) if key == "stop"));
}

#[test]
fn test_empty_mapping() {
    let file = mapping_file("{}");
    assert!(matches!(
        SignCatalog::load(file.path()).unwrap_err(),
        CatalogError::Empty
    ));
}

#[test]
fn test_env_example_points_at_first_run_files() {
    let env_example =
        std::fs::read_to_string(concat!(env!("CARGO_MANIFEST_DIR"), "/.env.example")).unwrap();

    assert!(env_example.contains("CATEGORY_MAPPING_PATH=config/class_to_sign.json"));
    assert!(env_example.contains("config/class_to_sign.example.json"));
    assert!(env_example.contains("OBJ_DETECT_WEIGHTS_URL"));
}
