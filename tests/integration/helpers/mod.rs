// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 集成测试共享的替身实现

use async_trait::async_trait;
use parking_lot::Mutex;
use probewatch::application::use_cases::probe_cycle::ProbeCycleRunner;
use probewatch::application::use_cases::publish_batch::BatchPublication;
use probewatch::domain::models::alert::Urgency;
use probewatch::domain::models::batch::BatchId;
use probewatch::domain::models::diagnostic::DiagnosticRecord;
use probewatch::domain::models::target::{EndpointRow, Target};
use probewatch::domain::repositories::target_repository::{RepositoryError, TargetRepository};
use probewatch::domain::services::notifier::{Notifier, NotifyError};
use probewatch::domain::services::publisher::{BatchPublisher, PublishError, PublishReceipt};
use probewatch::engines::traits::{ProbeEngine, ProbeEngineFactory, ProbeError, TransportConfig};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// 一次发布调用
#[derive(Debug, Clone)]
pub struct PublishedEntry {
    pub key: String,
    pub payload: Vec<u8>,
    pub count: usize,
}

impl PublishedEntry {
    pub fn records(&self) -> Vec<serde_json::Value> {
        serde_json::from_slice(&self.payload).unwrap()
    }
}

/// 记录调用的发布器
#[derive(Default)]
pub struct MockPublisher {
    pub entries: Mutex<Vec<PublishedEntry>>,
    pub delay: Option<Duration>,
    pub fail_publish: bool,
    pub fail_ping: bool,
}

impl MockPublisher {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_publish: true,
            fail_ping: true,
            ..Default::default()
        }
    }

    pub fn published(&self) -> Vec<PublishedEntry> {
        self.entries.lock().clone()
    }
}

#[async_trait]
impl BatchPublisher for MockPublisher {
    async fn publish(
        &self,
        key: &BatchId,
        payload: Vec<u8>,
        count: usize,
    ) -> Result<PublishReceipt, PublishError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_publish {
            return Err(PublishError::Transport("stream unavailable".to_string()));
        }

        let mut entries = self.entries.lock();
        entries.push(PublishedEntry {
            key: key.to_string(),
            payload,
            count,
        });
        Ok(PublishReceipt {
            topic: self.topic().to_string(),
            entry_id: format!("{}-0", entries.len()),
        })
    }

    async fn ping(&self) -> Result<(), PublishError> {
        if self.fail_ping {
            Err(PublishError::Transport("connection refused".to_string()))
        } else {
            Ok(())
        }
    }

    fn topic(&self) -> &str {
        "endpoint_test_results"
    }
}

/// 记录告警的通知器
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, Urgency)>>,
}

impl RecordingNotifier {
    pub fn count(&self, urgency: Urgency) -> usize {
        self.sent.lock().iter().filter(|(_, u)| *u == urgency).count()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, text: &str, urgency: Urgency) -> Result<(), NotifyError> {
        self.sent.lock().push((text.to_string(), urgency));
        Ok(())
    }
}

/// 固定返回若干行的目标仓库
#[derive(Default)]
pub struct StaticRepository {
    pub rows: Vec<EndpointRow>,
}

impl StaticRepository {
    pub fn with_paths(base: &str, paths: &[&str]) -> Self {
        let resource_id = Uuid::new_v4();
        let rows = paths
            .iter()
            .map(|path| EndpointRow {
                endpoint_id: Uuid::new_v4(),
                resource_id,
                user_id: Uuid::new_v4(),
                resource_base_url: base.to_string(),
                path: path.to_string(),
                method: "GET".to_string(),
                is_active: true,
            })
            .collect();
        Self { rows }
    }
}

#[async_trait]
impl TargetRepository for StaticRepository {
    async fn find_active_endpoints(&self) -> Result<Vec<EndpointRow>, RepositoryError> {
        Ok(self.rows.clone())
    }
}

/// 预设的探测结果
#[derive(Debug, Clone, Copy)]
pub enum Scripted {
    /// 成功，附带耗时（毫秒）
    Ok(u64),
    /// 连接失败
    Unreachable,
}

/// 按URL后缀返回预设结果的引擎
pub struct ScriptedEngine {
    script: Vec<(String, Scripted)>,
}

#[async_trait]
impl ProbeEngine for ScriptedEngine {
    async fn probe(&self, target: &Target) -> DiagnosticRecord {
        let outcome = self
            .script
            .iter()
            .find(|(suffix, _)| target.url.ends_with(suffix.as_str()))
            .map(|(_, outcome)| *outcome)
            .unwrap_or(Scripted::Ok(50));

        match outcome {
            Scripted::Ok(ms) => {
                let mut record = DiagnosticRecord::new(target);
                record.success = true;
                record.status_code = Some(200);
                record.response_time_ms = Some(ms as f64);
                record
            }
            Scripted::Unreachable => {
                DiagnosticRecord::failed(target, "Connection error: connection refused")
            }
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

pub struct ScriptedEngineFactory {
    script: Vec<(String, Scripted)>,
}

impl ScriptedEngineFactory {
    pub fn new(script: &[(&str, Scripted)]) -> Self {
        Self {
            script: script
                .iter()
                .map(|(suffix, outcome)| (suffix.to_string(), *outcome))
                .collect(),
        }
    }
}

impl ProbeEngineFactory for ScriptedEngineFactory {
    fn build(
        &self,
        _config: &TransportConfig,
        _notifier: Arc<dyn Notifier>,
    ) -> Result<Arc<dyn ProbeEngine>, ProbeError> {
        Ok(Arc::new(ScriptedEngine {
            script: self.script.clone(),
        }))
    }
}

/// 默认的发送确认超时
pub const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// 组装周期执行器
pub fn runner(
    factory: ScriptedEngineFactory,
    publisher: Arc<MockPublisher>,
    notifier: Arc<RecordingNotifier>,
    send_timeout: Duration,
) -> Arc<ProbeCycleRunner> {
    let publication = BatchPublication::new(publisher, notifier.clone(), send_timeout);
    Arc::new(ProbeCycleRunner::new(Arc::new(factory), notifier, publication))
}
