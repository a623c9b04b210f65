// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{
    runner, MockPublisher, RecordingNotifier, Scripted, ScriptedEngineFactory, StaticRepository,
    SEND_TIMEOUT,
};
use probewatch::application::use_cases::probe_cycle::CycleError;
use probewatch::config::settings::DispatchSettings;
use probewatch::domain::models::alert::Urgency;
use probewatch::domain::services::publisher::PublishError;
use probewatch::engines::traits::TransportConfig;
use probewatch::queue::scheduler::{CycleOutcome, DispatchScheduler};
use std::sync::Arc;
use std::time::Duration;

fn dispatch_settings() -> DispatchSettings {
    DispatchSettings {
        enabled: true,
        interval_secs: 60,
        max_concurrent: 4,
        timeout_secs: 5,
        correlation_prefix: "cycle".to_string(),
    }
}

fn scheduler(
    repository: StaticRepository,
    factory: ScriptedEngineFactory,
    publisher: Arc<MockPublisher>,
    notifier: Arc<RecordingNotifier>,
) -> DispatchScheduler {
    scheduler_with_timeout(repository, factory, publisher, notifier, SEND_TIMEOUT)
}

fn scheduler_with_timeout(
    repository: StaticRepository,
    factory: ScriptedEngineFactory,
    publisher: Arc<MockPublisher>,
    notifier: Arc<RecordingNotifier>,
    send_timeout: Duration,
) -> DispatchScheduler {
    DispatchScheduler::new(
        Arc::new(repository),
        runner(factory, publisher, notifier, send_timeout),
        dispatch_settings(),
        TransportConfig::default(),
    )
}

/// 无目标的周期不产生批次
#[tokio::test]
async fn test_empty_cycle_publishes_nothing() {
    let publisher = Arc::new(MockPublisher::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let scheduler = scheduler(
        StaticRepository::default(),
        ScriptedEngineFactory::new(&[]),
        publisher.clone(),
        notifier.clone(),
    );

    let outcome = scheduler.run_cycle().await.unwrap();

    assert!(matches!(outcome, CycleOutcome::Idle));
    assert!(publisher.published().is_empty());
    assert_eq!(notifier.count(Urgency::Info), 0);
}

/// 汇总统计：3 个目标、2 成功（100ms、300ms）、1 失败
#[tokio::test]
async fn test_cycle_summary_counts_and_mean() {
    let publisher = Arc::new(MockPublisher::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let scheduler = scheduler(
        StaticRepository::with_paths("https://api.example.com", &["/fast", "/slow", "/down"]),
        ScriptedEngineFactory::new(&[
            ("/fast", Scripted::Ok(100)),
            ("/slow", Scripted::Ok(300)),
            ("/down", Scripted::Unreachable),
        ]),
        publisher.clone(),
        notifier.clone(),
    );

    let report = match scheduler.run_cycle().await.unwrap() {
        CycleOutcome::Published(report) => report,
        other => panic!("expected a published cycle, got {:?}", other),
    };

    assert_eq!(report.summary.total, 3);
    assert_eq!(report.summary.successful, 2);
    assert_eq!(report.summary.failed, 1);
    assert!((report.summary.mean_elapsed_ms - 200.0).abs() < f64::EPSILON);
    assert_eq!(report.topic, "endpoint_test_results");
    assert!(report.batch_id.starts_with("cycle_3_"));

    // One summary alert per published batch
    assert_eq!(notifier.count(Urgency::Info), 1);

    let published = publisher.published();
    assert_eq!(published.len(), 1);
    let entry = &published[0];
    assert_eq!(entry.key, report.batch_id);
    assert_eq!(entry.count, 3);

    let records = entry.records();
    assert_eq!(records.len(), 3);
    let urls: Vec<&str> = records.iter().map(|r| r["url"].as_str().unwrap()).collect();
    assert_eq!(
        urls,
        vec![
            "https://api.example.com/fast",
            "https://api.example.com/slow",
            "https://api.example.com/down"
        ]
    );
    for record in &records {
        assert_eq!(record["batch_id"], report.batch_id.as_str());
        assert_eq!(record["service_version"], env!("CARGO_PKG_VERSION"));
        assert!(record["batch_timestamp"].is_string());
        assert!(record["endpoint_id"].is_string());
    }
    assert_eq!(records[2]["success"], false);
    assert!(records[2]["error"].as_str().unwrap().contains("Connection error"));
}

/// 重叠的两个周期得到不同的批次标识
#[tokio::test]
async fn test_overlapping_cycles_have_distinct_batches() {
    let publisher = Arc::new(MockPublisher::with_delay(Duration::from_millis(200)));
    let notifier = Arc::new(RecordingNotifier::default());
    let scheduler = Arc::new(scheduler(
        StaticRepository::with_paths("https://api.example.com", &["/a", "/b"]),
        ScriptedEngineFactory::new(&[]),
        publisher.clone(),
        notifier,
    ));

    let first = scheduler.clone();
    let second = scheduler.clone();
    let (a, b) = tokio::join!(
        async move { first.run_cycle().await },
        async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            second.run_cycle().await
        }
    );

    let ids: Vec<String> = [a.unwrap(), b.unwrap()]
        .into_iter()
        .map(|outcome| match outcome {
            CycleOutcome::Published(report) => {
                assert_eq!(report.summary.total, 2);
                assert_eq!(report.summary.successful + report.summary.failed, 2);
                report.batch_id
            }
            CycleOutcome::Idle => panic!("expected published cycles"),
        })
        .collect();
    assert_ne!(ids[0], ids[1]);

    let published = publisher.published();
    assert_eq!(published.len(), 2);
    for entry in &published {
        let records = entry.records();
        assert_eq!(records.len(), entry.count);
        assert!(records.iter().all(|r| r["batch_id"] == entry.key.as_str()));
    }
}

/// 发布失败时周期报错且不发送汇总告警
#[tokio::test]
async fn test_publish_failure_fails_cycle() {
    let publisher = Arc::new(MockPublisher::failing());
    let notifier = Arc::new(RecordingNotifier::default());
    let scheduler = scheduler(
        StaticRepository::with_paths("https://api.example.com", &["/a"]),
        ScriptedEngineFactory::new(&[]),
        publisher.clone(),
        notifier.clone(),
    );

    let result = scheduler.run_cycle().await;

    assert!(matches!(
        result,
        Err(CycleError::Publish(PublishError::Transport(_)))
    ));
    assert_eq!(notifier.count(Urgency::Info), 0);
}

/// 等待确认超时同样使周期失败，且不发送汇总告警
#[tokio::test]
async fn test_publish_timeout_fails_cycle() {
    let publisher = Arc::new(MockPublisher::with_delay(Duration::from_secs(2)));
    let notifier = Arc::new(RecordingNotifier::default());
    let scheduler = scheduler_with_timeout(
        StaticRepository::with_paths("https://api.example.com", &["/a", "/b"]),
        ScriptedEngineFactory::new(&[]),
        publisher.clone(),
        notifier.clone(),
        Duration::from_millis(300),
    );

    let result = scheduler.run_cycle().await;

    match result {
        Err(CycleError::Publish(PublishError::Timeout(waited))) => {
            assert_eq!(waited, Duration::from_millis(300));
        }
        other => panic!("expected a publish timeout, got {:?}", other),
    }
    assert!(publisher.published().is_empty());
    assert_eq!(notifier.count(Urgency::Info), 0);
}

/// 缺少基础URL或未激活的行被丢弃
#[tokio::test]
async fn test_unresolvable_and_inactive_rows_are_dropped() {
    let mut repository = StaticRepository::with_paths("https://api.example.com", &["/ok"]);
    let mut missing_base = repository.rows[0].clone();
    missing_base.resource_base_url = String::new();
    let mut paused = repository.rows[0].clone();
    paused.path = "/paused".to_string();
    paused.is_active = false;
    repository.rows.extend([missing_base, paused]);

    let scheduler = scheduler(
        repository,
        ScriptedEngineFactory::new(&[]),
        Arc::new(MockPublisher::default()),
        Arc::new(RecordingNotifier::default()),
    );

    let targets = scheduler.resolve_targets().await.unwrap();
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].url, "https://api.example.com/ok");
}
