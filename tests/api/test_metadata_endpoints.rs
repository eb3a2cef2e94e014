// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Metadata endpoint tests
//!
//! - GET /api/available_models lists the completion model allow-list
//! - GET /api/available_classes lists unique sign codes, sorted
//! - GET /health reports status, version, compute device and features

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;
use traffic_sign_assistant::{
    api::{create_app, AppState},
    vision::Device,
};

use crate::common::{self, MockDetectionModel};

fn app() -> axum::Router {
    let mut model = MockDetectionModel::new();
    model.expect_infer().never();
    model.expect_device().return_const(Device::Cpu);

    let settings = common::settings("http://127.0.0.1:1", "http://127.0.0.1:1");
    let state = AppState::from_settings(&settings, common::catalog(), Arc::new(model)).unwrap();
    create_app(Arc::new(state))
}

async fn get_json(uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_available_models() {
    let (status, body) = get_json("/api/available_models").await;

    assert_eq!(status, StatusCode::OK);
    let models = body["llm_models"].as_array().unwrap();
    assert_eq!(models.len(), 6);
    assert_eq!(models[0], "llama-v3p1-405b-instruct");
    assert!(models.iter().any(|m| m == "mixtral-8x7b-instruct"));
}

#[tokio::test]
async fn test_available_classes_unique_and_sorted() {
    let (status, body) = get_json("/api/available_classes").await;

    assert_eq!(status, StatusCode::OK);
    // 3.21 is mapped from two class ids but listed once
    assert_eq!(body["classes"], serde_json::json!(["1.1", "3.21", "5.1.2"]));
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get_json("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["device"], "cpu");
    assert_eq!(body["version"], traffic_sign_assistant::version::VERSION_NUMBER);

    let features: Vec<&str> = body["features"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f.as_str().unwrap())
        .collect();
    assert_eq!(features, traffic_sign_assistant::version::FEATURES);
}

#[tokio::test]
async fn test_unknown_route() {
    let request = Request::builder()
        .uri("/api/unknown")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
