// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{
    runner, MockPublisher, RecordingNotifier, Scripted, ScriptedEngineFactory, StaticRepository,
    SEND_TIMEOUT,
};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use probewatch::config::settings::Settings;
use probewatch::engines::traits::TransportConfig;
use probewatch::presentation::routes;
use probewatch::queue::scheduler::DispatchScheduler;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

fn settings() -> Arc<Settings> {
    Arc::new(Settings::load("PROBEWATCH_API_TEST").unwrap())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn app(publisher: Arc<MockPublisher>, notifier: Arc<RecordingNotifier>) -> Router {
    let runner = runner(
        ScriptedEngineFactory::new(&[("/down", Scripted::Unreachable)]),
        publisher,
        notifier,
        SEND_TIMEOUT,
    );
    routes::app(runner, settings(), None)
}

/// 受理请求并在后台发布批次
#[tokio::test]
async fn test_endpoints_accepts_and_publishes_in_background() {
    let publisher = Arc::new(MockPublisher::default());
    let notifier = Arc::new(RecordingNotifier::default());

    let response = app(publisher.clone(), notifier)
        .oneshot(post_json(
            "/api/v1/test-endpoints",
            json!({
                "urls": ["https://ok.test/", "https://err.test/down"],
                "max_concurrent": 2,
                "timeout": 5
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = json_body(response).await;
    assert_eq!(body["total_urls"], 2);
    assert_eq!(body["topic"], "endpoint_test_results");
    let batch_id = body["batch_id"].as_str().unwrap().to_string();
    assert!(batch_id.starts_with("test_2_"));

    let mut published = Vec::new();
    for _ in 0..50 {
        published = publisher.published();
        if !published.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].key, batch_id);

    let records = published[0].records();
    assert_eq!(records[0]["url"], "https://ok.test/");
    assert_eq!(records[0]["success"], true);
    assert_eq!(records[1]["success"], false);
    assert!(records[1]["endpoint_id"].is_null());
}

/// 校验失败返回 422
#[tokio::test]
async fn test_endpoints_rejects_invalid_request() {
    let publisher = Arc::new(MockPublisher::default());
    let app = app(publisher.clone(), Arc::new(RecordingNotifier::default()));

    let response = app
        .clone()
        .oneshot(post_json("/api/v1/test-endpoints", json!({ "urls": [] })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .oneshot(post_json(
            "/api/v1/test-endpoints",
            json!({ "urls": ["https://ok.test/"], "max_concurrent": 0 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(publisher.published().is_empty());
}

/// 发布端不可达时返回 503 且不开始探测
#[tokio::test]
async fn test_endpoints_unavailable_when_publisher_down() {
    let publisher = Arc::new(MockPublisher::failing());
    let response = app(publisher, Arc::new(RecordingNotifier::default()))
        .oneshot(post_json(
            "/api/v1/test-endpoints",
            json!({ "urls": ["https://ok.test/"] }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("connection refused"));
}

/// 未配置目标存储时手动调度返回 503
#[tokio::test]
async fn test_dispatch_without_store() {
    let response = app(
        Arc::new(MockPublisher::default()),
        Arc::new(RecordingNotifier::default()),
    )
    .oneshot(post_json("/api/v1/dispatch", json!({})))
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

/// 手动调度返回周期结果
#[tokio::test]
async fn test_dispatch_returns_cycle_outcome() {
    let publisher = Arc::new(MockPublisher::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let runner = runner(
        ScriptedEngineFactory::new(&[]),
        publisher.clone(),
        notifier,
        SEND_TIMEOUT,
    );
    let settings = settings();
    let scheduler = Arc::new(DispatchScheduler::new(
        Arc::new(StaticRepository::with_paths(
            "https://api.example.com",
            &["/health"],
        )),
        runner.clone(),
        settings.dispatch.clone(),
        TransportConfig::default(),
    ));

    let response = routes::app(runner, settings, Some(scheduler))
        .oneshot(post_json("/api/v1/dispatch", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "published");
    assert_eq!(body["total"], 1);
    assert_eq!(body["successful"], 1);
    assert_eq!(publisher.published().len(), 1);
}
