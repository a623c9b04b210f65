// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::alert::{AlertEvent, Urgency};
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

/// 通知错误类型
#[derive(Error, Debug)]
pub enum NotifyError {
    /// 通知通道未启用或缺少凭据
    #[error("Notifier is disabled")]
    Disabled,
    /// 传输失败
    #[error("Notification transport error: {0}")]
    Transport(String),
    /// 通道拒绝了消息
    #[error("Notification rejected with status {status}")]
    Rejected { status: u16 },
}

/// 通知器特质
///
/// 旁路消息通道的唯一入口，探测引擎与发布流程只依赖该接口
#[async_trait]
pub trait Notifier: Send + Sync {
    /// 发送一条通知
    ///
    /// # 参数
    ///
    /// * `text` - 已格式化的消息文本
    /// * `urgency` - 紧急程度
    async fn notify(&self, text: &str, urgency: Urgency) -> Result<(), NotifyError>;
}

/// 尽力发送告警
///
/// 通知失败只记录日志与计数，永远不向调用方传播
pub async fn emit_alert(notifier: &dyn Notifier, alert: &AlertEvent) {
    let text = alert.render();
    match notifier.notify(&text, alert.urgency()).await {
        Ok(()) => debug!("Alert delivered ({})", alert.urgency().as_str()),
        Err(NotifyError::Disabled) => debug!("Alert skipped, notifier disabled"),
        Err(e) => {
            metrics::counter!("probe_alerts_failed_total").increment(1);
            warn!("Failed to deliver alert: {}", e);
        }
    }
}
