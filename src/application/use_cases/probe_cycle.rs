// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::application::use_cases::publish_batch::BatchPublication;
use crate::domain::models::batch::BatchSummary;
use crate::domain::models::diagnostic::DiagnosticRecord;
use crate::domain::models::target::Target;
use crate::domain::repositories::target_repository::RepositoryError;
use crate::domain::services::aggregator::{BatchAggregator, BatchTicket};
use crate::domain::services::notifier::Notifier;
use crate::domain::services::publisher::PublishError;
use crate::engines::traits::{ProbeEngineFactory, TransportConfig};
use crate::workers::ProbePool;

/// 周期错误类型
#[derive(Error, Debug)]
pub enum CycleError {
    /// 目标解析失败
    #[error("Failed to resolve targets: {0}")]
    Resolve(#[from] RepositoryError),
    /// 批次发布失败
    #[error("Failed to publish batch: {0}")]
    Publish(#[from] PublishError),
}

/// 周期报告
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub batch_id: String,
    pub topic: String,
    pub entry_id: String,
    #[serde(flatten)]
    pub summary: BatchSummary,
}

/// 探测周期执行器
///
/// 负责一个周期的完整流程：构建本周期的引擎、扇出探测、组装批次并发布
pub struct ProbeCycleRunner {
    factory: Arc<dyn ProbeEngineFactory>,
    notifier: Arc<dyn Notifier>,
    aggregator: BatchAggregator,
    publication: BatchPublication,
}

impl ProbeCycleRunner {
    pub fn new(
        factory: Arc<dyn ProbeEngineFactory>,
        notifier: Arc<dyn Notifier>,
        publication: BatchPublication,
    ) -> Self {
        Self {
            factory,
            notifier,
            aggregator: BatchAggregator::new(),
            publication,
        }
    }

    pub fn publication(&self) -> &BatchPublication {
        &self.publication
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// 以当前时间开启一个批次
    pub fn open(&self, correlation: &str) -> BatchTicket {
        self.aggregator.open(correlation, Utc::now())
    }

    /// 执行周期
    ///
    /// # 参数
    ///
    /// * `ticket` - 已分配的批次标识
    /// * `targets` - 本周期的目标（按此顺序输出）
    /// * `transport` - 本周期的传输配置
    /// * `concurrency` - 并发上限
    ///
    /// # 返回值
    ///
    /// * `Ok(CycleReport)` - 批次已发布
    /// * `Err(CycleError::Publish)` - 发布失败，批次不会自动重试
    #[instrument(skip_all, fields(batch_id = %ticket.id, targets = targets.len()))]
    pub async fn execute(
        &self,
        ticket: BatchTicket,
        targets: &[Target],
        transport: &TransportConfig,
        concurrency: usize,
    ) -> Result<CycleReport, CycleError> {
        let records = match self.factory.build(transport, self.notifier.clone()) {
            Ok(engine) => {
                info!(
                    "Probing {} targets with {} engine (concurrency {})",
                    targets.len(),
                    engine.name(),
                    concurrency
                );
                ProbePool::new(engine, concurrency).run(targets).await
            }
            Err(e) => {
                warn!("Probe engine unavailable, recording failures: {}", e);
                targets
                    .iter()
                    .map(|t| DiagnosticRecord::failed(t, format!("Probe engine unavailable: {}", e)))
                    .collect()
            }
        };

        let batch = self.aggregator.assemble(ticket, targets, records);
        let receipt = self.publication.publish(&batch).await?;

        Ok(CycleReport {
            batch_id: batch.id.to_string(),
            topic: receipt.topic,
            entry_id: receipt.entry_id,
            summary: batch.summary,
        })
    }
}
