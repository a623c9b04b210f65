// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::domain::models::batch::{Batch, BatchId, BatchIdGenerator, BatchSummary};
use crate::domain::models::diagnostic::DiagnosticRecord;
use crate::domain::models::target::Target;

/// 已分配标识、尚未填充记录的批次
#[derive(Debug, Clone)]
pub struct BatchTicket {
    pub id: BatchId,
    pub started_at: DateTime<Utc>,
}

/// 批次聚合器
///
/// 为周期分配批次标识，并把按目标顺序排列的结果组装成批次
pub struct BatchAggregator {
    generator: &'static BatchIdGenerator,
}

impl BatchAggregator {
    pub fn new() -> Self {
        Self {
            generator: BatchIdGenerator::global(),
        }
    }

    /// 为新周期分配批次标识
    ///
    /// # 参数
    ///
    /// * `correlation` - 调度方提供的关联串
    /// * `started_at` - 周期开始时间
    pub fn open(&self, correlation: &str, started_at: DateTime<Utc>) -> BatchTicket {
        let (id, started_at) = self.generator.next(correlation, started_at);
        BatchTicket { id, started_at }
    }

    /// 组装批次
    ///
    /// 结果数量少于目标数量时，缺失位置以合成失败记录补齐；多余结果被丢弃。
    /// 返回批次的记录数恒等于目标数。
    pub fn assemble(
        &self,
        ticket: BatchTicket,
        targets: &[Target],
        mut outcomes: Vec<DiagnosticRecord>,
    ) -> Batch {
        if outcomes.len() != targets.len() {
            warn!(
                "Batch {} expected {} outcomes, got {}",
                ticket.id,
                targets.len(),
                outcomes.len()
            );
            outcomes.truncate(targets.len());
            for target in &targets[outcomes.len()..] {
                outcomes.push(DiagnosticRecord::failed(target, "probe outcome missing"));
            }
        }

        let summary = BatchSummary::from_records(&outcomes);
        Batch {
            id: ticket.id,
            started_at: ticket.started_at,
            records: outcomes,
            summary,
        }
    }
}

impl Default for BatchAggregator {
    fn default() -> Self {
        Self::new()
    }
}
