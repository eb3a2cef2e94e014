// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Prediction endpoint tests for POST /api/predict
//!
//! The detection model is mocked; the sign info site and the completion
//! API are local axum servers, so every request runs the real pipeline:
//! upload parsing, detection filtering, enrichment, prompt rendering and
//! the completion call.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;
use traffic_sign_assistant::{
    api::{create_app, AppState},
    vision::Device,
};

use crate::common::{self, Captured, MockDetectionModel};

async fn app_with(model: MockDetectionModel, completion: &str, status: StatusCode) -> (Router, Captured) {
    let site = common::sign_site().await;
    let (api, captured) = common::completion_api(completion, status).await;

    let settings = common::settings(&site, &api);
    let state = AppState::from_settings(&settings, common::catalog(), Arc::new(model)).unwrap();
    (create_app(Arc::new(state)), captured)
}

fn model_returning(detections: Vec<traffic_sign_assistant::vision::RawDetection>) -> MockDetectionModel {
    let mut model = MockDetectionModel::new();
    model
        .expect_infer()
        .times(1)
        .returning(move |_| Ok(detections.clone()));
    model.expect_device().return_const(Device::Cpu);
    model
}

fn unused_model() -> MockDetectionModel {
    let mut model = MockDetectionModel::new();
    model.expect_infer().never();
    model.expect_device().return_const(Device::Cpu);
    model
}

fn predict_request(query: &str, content_type: Option<&str>, data: &[u8]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(format!("/api/predict{}", query))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", common::BOUNDARY),
        )
        .body(Body::from(common::multipart_body(content_type, data)))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn prompt_of(captured: &Captured, index: usize) -> String {
    captured.lock().unwrap()[index]["prompt"]
        .as_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn test_predict_returns_hints_verbatim() {
    let hints = " Do not enter this road. Find another route.";
    let (app, captured) = app_with(
        model_returning(vec![common::detection(7, 0.92)]),
        hints,
        StatusCode::OK,
    )
    .await;

    let (status, body) = send(app, predict_request("", Some("image/png"), &common::png_bytes())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hints"], hints);

    let requests = captured.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0]["model"],
        "accounts/fireworks/models/llama-v3p1-405b-instruct"
    );

    let prompt = prompt_of(&captured, 0);
    assert!(prompt.contains("Road sign 3.21:"));
    assert!(prompt.contains("SIGN_NAME: No entry"));
    assert!(prompt.contains("SIGN_CATEGORY: Prohibitory signs"));
    assert!(prompt.contains("SIGN_DESCRIPTION: Entry of all vehicles is prohibited."));
}

#[tokio::test]
async fn test_predict_without_detections_still_calls_completion() {
    let (app, captured) = app_with(model_returning(Vec::new()), "NO SIGNS DETECTED", StatusCode::OK).await;

    let (status, body) = send(app, predict_request("", Some("image/png"), &common::png_bytes())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hints"], "NO SIGNS DETECTED");
    assert_eq!(captured.lock().unwrap().len(), 1);
    assert!(prompt_of(&captured, 0).contains("```\n\n```"));
}

#[tokio::test]
async fn test_predict_threshold_from_query() {
    let (app, captured) = app_with(
        model_returning(vec![common::detection(7, 0.6), common::detection(12, 0.8)]),
        "ok",
        StatusCode::OK,
    )
    .await;

    let (status, _) = send(
        app,
        predict_request(
            "?confidence_threshold=0.7&llm_model_name=mixtral-8x7b-instruct",
            Some("image/png"),
            &common::png_bytes(),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let prompt = prompt_of(&captured, 0);
    assert!(prompt.contains("Road sign 5.1.2:"));
    assert!(!prompt.contains("Road sign 3.21:"));
    // 5.1.2 has no page on the fixture site
    assert!(prompt.contains("SIGN_NAME: unknown"));
    assert_eq!(
        captured.lock().unwrap()[0]["model"],
        "accounts/fireworks/models/mixtral-8x7b-instruct"
    );
}

#[tokio::test]
async fn test_predict_invalid_image_type() {
    let (app, captured) = app_with(unused_model(), "unused", StatusCode::OK).await;

    let (status, body) = send(app, predict_request("", Some("text/plain"), b"not a sign")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invalid image type");
    assert!(captured.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_predict_part_without_content_type() {
    let (app, _) = app_with(unused_model(), "unused", StatusCode::OK).await;

    let (status, body) = send(app, predict_request("", None, &common::png_bytes())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Image not provided");
}

#[tokio::test]
async fn test_predict_without_multipart_body() {
    let (app, _) = app_with(unused_model(), "unused", StatusCode::OK).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Image not provided");
}

#[tokio::test]
async fn test_predict_undecodable_image() {
    let (app, _) = app_with(unused_model(), "unused", StatusCode::OK).await;

    let (status, body) = send(app, predict_request("", Some("image/png"), b"\x89PNG broken")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().starts_with("Invalid image:"));
}

#[tokio::test]
async fn test_predict_unknown_model() {
    let (app, captured) = app_with(unused_model(), "unused", StatusCode::OK).await;

    let (status, body) = send(
        app,
        predict_request("?llm_model_name=gpt-4", Some("image/png"), &common::png_bytes()),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains("Provided model name gpt-4 is not supported. Please choose from"));
    assert!(detail.contains("llama-v3p1-70b-instruct"));
    assert!(captured.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_predict_threshold_out_of_range() {
    let (app, _) = app_with(unused_model(), "unused", StatusCode::OK).await;

    let (status, body) = send(
        app,
        predict_request("?confidence_threshold=1.5", Some("image/png"), &common::png_bytes()),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("between 0 and 1"));
}

#[tokio::test]
async fn test_predict_completion_failure() {
    let (app, captured) = app_with(
        model_returning(vec![common::detection(0, 0.9)]),
        "service overloaded",
        StatusCode::SERVICE_UNAVAILABLE,
    )
    .await;

    let (status, body) = send(app, predict_request("", Some("image/png"), &common::png_bytes())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains("503"));
    assert!(detail.contains("service overloaded"));
    assert_eq!(captured.lock().unwrap().len(), 1);
}
