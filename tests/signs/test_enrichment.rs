// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Sign record enrichment against a local sign info site

use image::DynamicImage;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use traffic_sign_assistant::signs::{
    SignError, SignInfo, SignInfoClient, SignInfoConfig, SignKey, SignRecord,
};
use traffic_sign_assistant::vision::{Device, TrafficSignDetector};

use crate::common;

fn client(site: &str) -> SignInfoClient {
    SignInfoClient::new(SignInfoConfig {
        info_url_template: format!("{}/znaky/{{category}}/{{sign_code}}", site),
        image_url_template: format!("{}/{{image_source}}", site),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

#[tokio::test]
async fn test_load_by_class_id_fills_all_fields() {
    let site = common::sign_site().await;
    let record = SignRecord::load(SignKey::ClassId(7), &common::catalog(), &client(&site))
        .await
        .unwrap();

    assert_eq!(record.class_id, 7);
    assert_eq!(record.sign_code, "3.21");
    assert_eq!(record.name.as_deref(), Some("No entry"));
    assert_eq!(record.category.as_deref(), Some("Prohibitory signs"));
    assert_eq!(
        record.description.as_deref(),
        Some("Entry of all vehicles is prohibited.")
    );
    assert_eq!(
        record.sign_image,
        Some(format!("{}/images/znaky/3.21.png", site))
    );
}

#[tokio::test]
async fn test_load_by_sign_code_derives_class_id() {
    let site = common::sign_site().await;
    let record = SignRecord::load(
        SignKey::SignCode("3.21".to_string()),
        &common::catalog(),
        &client(&site),
    )
    .await
    .unwrap();

    // Two class ids map to 3.21; the lowest one wins
    assert_eq!(record.class_id, 7);
    assert_eq!(record.name.as_deref(), Some("No entry"));
}

#[tokio::test]
async fn test_missing_page_leaves_fields_unset() {
    let site = common::sign_site().await;
    let record = SignRecord::load(SignKey::ClassId(12), &common::catalog(), &client(&site))
        .await
        .unwrap();

    assert_eq!(record.sign_code, "5.1.2");
    assert!(record.name.is_none());
    assert!(record.category.is_none());
    assert!(record.description.is_none());
    assert!(record.sign_image.is_none());
}

#[tokio::test]
async fn test_unknown_keys_fail_before_fetching() {
    let client = client("http://127.0.0.1:1");

    let err = SignRecord::load(SignKey::ClassId(99), &common::catalog(), &client)
        .await
        .unwrap_err();
    assert_eq!(err, SignError::UnknownClassId(99));
    assert_eq!(err.to_string(), "Invalid class ID: 99");

    let err = SignRecord::load(
        SignKey::SignCode("9.9".to_string()),
        &common::catalog(),
        &client,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, SignError::UnknownSignCode(code) if code == "9.9"));
}

#[tokio::test]
async fn test_lookup_returns_scraped_info() {
    let site = common::sign_site().await;
    let info = client(&site).lookup("3.21").await;

    assert_eq!(info.name.as_deref(), Some("No entry"));
    assert_ne!(info, SignInfo::default());
}

#[tokio::test]
async fn test_detector_fetches_each_sign_page_once() {
    let (site, requests) = common::slow_sign_site(Duration::from_millis(50)).await;

    // Classes 7 and 8 both map to 3.21
    let mut detections = vec![common::detection(12, 0.8)];
    detections.extend((0..40).map(|_| common::detection(7, 0.9)));
    detections.extend((0..10).map(|_| common::detection(8, 0.7)));

    let mut model = common::MockDetectionModel::new();
    model
        .expect_infer()
        .times(1)
        .returning(move |_| Ok(detections.clone()));
    model.expect_device().return_const(Device::Cpu);

    let detector = TrafficSignDetector::new(
        Arc::new(model),
        Arc::new(common::catalog()),
        client(&site),
    );
    let predictions = detector
        .detect(DynamicImage::new_rgb8(640, 480), 0.5)
        .await
        .unwrap();

    assert_eq!(predictions.len(), 51);
    assert_eq!(predictions[0].sign_code(), "5.1.2");
    assert!(predictions[0].name().is_none());
    assert_eq!(predictions[1].class_id(), 7);
    assert_eq!(predictions[50].class_id(), 8);
    assert!(predictions[1..]
        .iter()
        .all(|p| p.name() == Some("No entry")));

    assert_eq!(requests.total.load(Ordering::SeqCst), 2);
    assert_eq!(requests.max_in_flight.load(Ordering::SeqCst), 1);
}
