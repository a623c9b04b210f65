// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use tracing::debug;

use crate::domain::models::batch::BatchId;
use crate::domain::services::publisher::{BatchPublisher, PublishError, PublishReceipt};

fn transport(e: redis::RedisError) -> PublishError {
    PublishError::Transport(e.to_string())
}

/// Redis Streams 批次发布器
///
/// 每个批次对应一条 `XADD` 条目，字段为 `key`、`count` 与 `value`
#[derive(Clone)]
pub struct RedisStreamPublisher {
    /// Redis客户端
    client: redis::Client,
    /// 流名称
    topic: String,
    /// 近似裁剪长度
    max_len: Option<usize>,
}

impl RedisStreamPublisher {
    /// 创建新的发布器
    ///
    /// # 参数
    ///
    /// * `redis_url` - Redis连接URL
    /// * `topic` - 流名称
    /// * `max_len` - 近似裁剪长度（`MAXLEN ~`）
    ///
    /// # 返回值
    ///
    /// * `Ok(RedisStreamPublisher)` - 发布器实例
    /// * `Err(PublishError::Transport)` - URL无效
    pub fn new(
        redis_url: &str,
        topic: impl Into<String>,
        max_len: Option<usize>,
    ) -> Result<Self, PublishError> {
        let client = redis::Client::open(redis_url).map_err(transport)?;
        Ok(Self {
            client,
            topic: topic.into(),
            max_len,
        })
    }
}

#[async_trait]
impl BatchPublisher for RedisStreamPublisher {
    async fn publish(
        &self,
        key: &BatchId,
        payload: Vec<u8>,
        count: usize,
    ) -> Result<PublishReceipt, PublishError> {
        let mut con = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(transport)?;

        let mut cmd = redis::cmd("XADD");
        cmd.arg(&self.topic);
        if let Some(max_len) = self.max_len {
            cmd.arg("MAXLEN").arg("~").arg(max_len);
        }
        cmd.arg("*")
            .arg("key")
            .arg(key.as_str())
            .arg("count")
            .arg(count)
            .arg("value")
            .arg(payload);

        let entry_id: String = cmd.query_async(&mut con).await.map_err(transport)?;
        debug!("XADD {} -> {}", self.topic, entry_id);

        Ok(PublishReceipt {
            topic: self.topic.clone(),
            entry_id,
        })
    }

    async fn ping(&self) -> Result<(), PublishError> {
        let mut con = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(transport)?;
        let _: String = redis::cmd("PING")
            .query_async(&mut con)
            .await
            .map_err(transport)?;
        Ok(())
    }

    fn topic(&self) -> &str {
        &self.topic
    }
}
