// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::batch::BatchId;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// 发布错误类型
#[derive(Error, Debug)]
pub enum PublishError {
    /// 批次序列化失败
    #[error("Failed to serialize batch: {0}")]
    Serialization(#[from] serde_json::Error),
    /// 下游传输失败
    #[error("Stream transport error: {0}")]
    Transport(String),
    /// 等待确认超时
    #[error("Timed out after {0:?} waiting for stream acknowledgement")]
    Timeout(Duration),
}

/// 下游确认回执
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    /// 主题
    pub topic: String,
    /// 传输层分配的条目ID
    pub entry_id: String,
}

/// 批次发布器特质
///
/// 每个周期只调用一次 `publish`，整个批次作为一条消息写入
#[async_trait]
pub trait BatchPublisher: Send + Sync {
    /// 写入一条消息并等待确认
    ///
    /// # 参数
    ///
    /// * `key` - 批次标识
    /// * `payload` - 序列化后的批次
    /// * `count` - 批次中的记录数
    async fn publish(
        &self,
        key: &BatchId,
        payload: Vec<u8>,
        count: usize,
    ) -> Result<PublishReceipt, PublishError>;

    /// 检查下游是否可达
    async fn ping(&self) -> Result<(), PublishError>;

    /// 目标主题
    fn topic(&self) -> &str;
}
