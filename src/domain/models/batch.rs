// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use super::diagnostic::DiagnosticRecord;

/// 批次标识
///
/// 格式为 `{关联串}_{周期开始毫秒}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(String);

impl BatchId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 批次标识生成器
///
/// 毫秒时间戳在进程内严格递增：同一毫秒内开始的两个周期会得到相邻的不同时间戳，
/// 因此即便周期在时间上重叠，标识也不会冲突。
pub struct BatchIdGenerator {
    last_ms: AtomicI64,
}

static GLOBAL_GENERATOR: Lazy<BatchIdGenerator> = Lazy::new(BatchIdGenerator::new);

impl BatchIdGenerator {
    pub fn new() -> Self {
        Self {
            last_ms: AtomicI64::new(0),
        }
    }

    /// 获取进程级共享的生成器
    pub fn global() -> &'static BatchIdGenerator {
        &GLOBAL_GENERATOR
    }

    /// 生成批次标识
    ///
    /// # 参数
    ///
    /// * `correlation` - 调用方提供的关联串
    /// * `started_at` - 周期开始时间
    ///
    /// # 返回值
    ///
    /// 返回批次标识及实际采用的开始时间（可能比传入值晚若干毫秒）
    pub fn next(&self, correlation: &str, started_at: DateTime<Utc>) -> (BatchId, DateTime<Utc>) {
        let wanted = started_at.timestamp_millis();
        let mut last = self.last_ms.load(Ordering::Relaxed);
        let assigned = loop {
            let candidate = wanted.max(last + 1);
            match self.last_ms.compare_exchange_weak(
                last,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break candidate,
                Err(observed) => last = observed,
            }
        };

        let timestamp = Utc
            .timestamp_millis_opt(assigned)
            .single()
            .unwrap_or(started_at);
        (BatchId(format!("{}_{}", correlation, assigned)), timestamp)
    }
}

impl Default for BatchIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// 批次汇总统计
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// 成功探测的平均耗时（毫秒），无成功时为0
    pub mean_elapsed_ms: f64,
}

impl BatchSummary {
    pub fn from_records(records: &[DiagnosticRecord]) -> Self {
        let elapsed: Vec<f64> = records
            .iter()
            .filter(|r| r.success)
            .map(|r| r.response_time_ms.unwrap_or(0.0))
            .collect();

        let successful = elapsed.len();
        let mean_elapsed_ms = if successful == 0 {
            0.0
        } else {
            elapsed.iter().sum::<f64>() / successful as f64
        };

        Self {
            total: records.len(),
            successful,
            failed: records.len() - successful,
            mean_elapsed_ms,
        }
    }

    /// 成功率（百分比）
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.successful as f64 / self.total as f64 * 100.0
        }
    }
}

/// 一个调度周期产出的有序批次
#[derive(Debug, Clone)]
pub struct Batch {
    pub id: BatchId,
    pub started_at: DateTime<Utc>,
    pub records: Vec<DiagnosticRecord>,
    pub summary: BatchSummary,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 构建发往下游流的消息体
    ///
    /// 消息为单个JSON数组，每条记录附带批次标识、批次时间与服务版本
    pub fn to_message(&self, service_version: &str) -> Result<Vec<u8>, serde_json::Error> {
        let batch_timestamp = self.started_at.to_rfc3339();
        let mut enriched = Vec::with_capacity(self.records.len());

        for record in &self.records {
            let mut value = serde_json::to_value(record)?;
            if let Value::Object(map) = &mut value {
                map.insert("batch_id".into(), Value::String(self.id.to_string()));
                map.insert(
                    "batch_timestamp".into(),
                    Value::String(batch_timestamp.clone()),
                );
                map.insert(
                    "service_version".into(),
                    Value::String(service_version.to_string()),
                );
            }
            enriched.push(value);
        }

        serde_json::to_vec(&enriched)
    }
}
