// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::settings::NotifierSettings;
use crate::domain::models::alert::Urgency;
use crate::domain::services::notifier::{Notifier, NotifyError};

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_notification: bool,
}

/// Telegram Bot API 通知器
pub struct TelegramNotifier {
    /// HTTP 客户端
    client: reqwest::Client,
    /// sendMessage 接口地址
    endpoint: String,
    chat_id: String,
    parse_mode: String,
}

impl TelegramNotifier {
    /// 创建新的通知器
    ///
    /// # 参数
    ///
    /// * `api_base` - Bot API 基础地址
    /// * `bot_token` - Bot 令牌
    /// * `chat_id` - 目标会话
    /// * `parse_mode` - 消息解析模式
    /// * `timeout` - 请求超时，约束单次告警占用探测工作协程的时长
    ///
    /// # 返回值
    ///
    /// * `Ok(TelegramNotifier)` - 通知器实例
    /// * `Err(NotifyError::Transport)` - HTTP客户端构建失败
    pub fn new(
        api_base: &str,
        bot_token: &str,
        chat_id: impl Into<String>,
        parse_mode: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/bot{}/sendMessage",
                api_base.trim_end_matches('/'),
                bot_token
            ),
            chat_id: chat_id.into(),
            parse_mode: parse_mode.into(),
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str, urgency: Urgency) -> Result<(), NotifyError> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: &self.parse_mode,
            disable_notification: urgency == Urgency::Info,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(NotifyError::Rejected {
                status: response.status().as_u16(),
            })
        }
    }
}

/// 未启用的通知器
///
/// 只记录日志
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn notify(&self, _text: &str, urgency: Urgency) -> Result<(), NotifyError> {
        info!("Notifier disabled, dropping {} alert", urgency.as_str());
        Err(NotifyError::Disabled)
    }
}

/// 按配置构建通知器
///
/// 未启用、缺少令牌或会话、客户端构建失败时返回 `DisabledNotifier`
pub fn notifier_from_settings(settings: &NotifierSettings) -> Arc<dyn Notifier> {
    if !settings.enabled {
        return Arc::new(DisabledNotifier);
    }

    match (settings.bot_token.as_deref(), settings.chat_id.as_deref()) {
        (Some(token), Some(chat_id)) if !token.is_empty() && !chat_id.is_empty() => {
            match TelegramNotifier::new(
                &settings.api_base,
                token,
                chat_id,
                settings.parse_mode.clone(),
                Duration::from_secs(settings.timeout_secs),
            ) {
                Ok(notifier) => Arc::new(notifier),
                Err(e) => {
                    warn!("Notifier disabled: {}", e);
                    Arc::new(DisabledNotifier)
                }
            }
        }
        _ => {
            warn!("Notifier enabled but bot token or chat id is missing");
            Arc::new(DisabledNotifier)
        }
    }
}
