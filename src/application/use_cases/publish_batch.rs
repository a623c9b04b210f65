// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::domain::models::alert::AlertEvent;
use crate::domain::models::batch::Batch;
use crate::domain::services::notifier::{emit_alert, Notifier};
use crate::domain::services::publisher::{BatchPublisher, PublishError, PublishReceipt};

/// 批次发布用例
///
/// 把整个批次作为一条消息写入下游流，确认后发送汇总告警
pub struct BatchPublication {
    publisher: Arc<dyn BatchPublisher>,
    notifier: Arc<dyn Notifier>,
    send_timeout: Duration,
    service_version: String,
}

impl BatchPublication {
    pub fn new(
        publisher: Arc<dyn BatchPublisher>,
        notifier: Arc<dyn Notifier>,
        send_timeout: Duration,
    ) -> Self {
        Self {
            publisher,
            notifier,
            send_timeout,
            service_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn publisher(&self) -> &Arc<dyn BatchPublisher> {
        &self.publisher
    }

    /// 发布批次
    ///
    /// # 参数
    ///
    /// * `batch` - 已组装的批次
    ///
    /// # 返回值
    ///
    /// * `Ok(PublishReceipt)` - 下游已确认
    /// * `Err(PublishError)` - 序列化失败、传输失败或等待确认超时
    pub async fn publish(&self, batch: &Batch) -> Result<PublishReceipt, PublishError> {
        let result = self.send(batch).await;

        match &result {
            Ok(receipt) => {
                metrics::counter!("batches_published_total").increment(1);
                info!(
                    "Published batch {} ({} records) to {} as {}",
                    batch.id,
                    batch.len(),
                    receipt.topic,
                    receipt.entry_id
                );
                emit_alert(self.notifier.as_ref(), &AlertEvent::Summary(batch.summary)).await;
            }
            Err(e) => {
                metrics::counter!("batches_publish_failed_total").increment(1);
                error!("Failed to publish batch {}: {}", batch.id, e);
            }
        }

        result
    }

    async fn send(&self, batch: &Batch) -> Result<PublishReceipt, PublishError> {
        let payload = batch.to_message(&self.service_version)?;
        tokio::time::timeout(
            self.send_timeout,
            self.publisher.publish(&batch.id, payload, batch.len()),
        )
        .await
        .map_err(|_| PublishError::Timeout(self.send_timeout))?
    }
}
