// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, instrument};

use crate::application::use_cases::probe_cycle::{CycleError, CycleReport, ProbeCycleRunner};
use crate::config::settings::DispatchSettings;
use crate::domain::models::target::Target;
use crate::domain::repositories::target_repository::{RepositoryError, TargetRepository};
use crate::engines::traits::TransportConfig;

/// 一次调度周期的结果
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CycleOutcome {
    /// 没有处于监控状态的目标，未发布任何批次
    Idle,
    /// 批次已发布
    Published(CycleReport),
}

/// 调度周期执行器
///
/// 按固定节拍从目标存储解析目标并触发探测周期。
/// 周期之间不做同步：慢周期不会阻塞下一次触发，也不会被跳过。
pub struct DispatchScheduler {
    /// 目标仓库
    repository: Arc<dyn TargetRepository>,
    /// 周期执行器
    runner: Arc<ProbeCycleRunner>,
    /// 调度配置
    settings: DispatchSettings,
    /// 周期内使用的传输配置
    transport: TransportConfig,
}

impl DispatchScheduler {
    /// 创建新的调度器实例
    ///
    /// # 参数
    ///
    /// * `repository` - 目标仓库
    /// * `runner` - 周期执行器
    /// * `settings` - 调度配置
    /// * `transport` - 周期内使用的传输配置
    pub fn new(
        repository: Arc<dyn TargetRepository>,
        runner: Arc<ProbeCycleRunner>,
        settings: DispatchSettings,
        transport: TransportConfig,
    ) -> Self {
        Self {
            repository,
            runner,
            settings,
            transport,
        }
    }

    /// 解析当前的目标集合
    ///
    /// 无法构造绝对URL的行被丢弃
    pub async fn resolve_targets(&self) -> Result<Vec<Target>, RepositoryError> {
        let rows = self.repository.find_active_endpoints().await?;
        let total = rows.len();

        let targets: Vec<Target> = rows
            .iter()
            .filter(|row| row.is_active)
            .filter_map(Target::from_row)
            .collect();

        if targets.len() < total {
            debug!("Dropped {} endpoints without a resolvable URL", total - targets.len());
        }
        Ok(targets)
    }

    /// 执行一次调度周期
    ///
    /// # 返回值
    ///
    /// * `Ok(CycleOutcome::Idle)` - 目标集合为空，未发布
    /// * `Ok(CycleOutcome::Published)` - 批次已发布
    /// * `Err(CycleError)` - 目标解析或发布失败
    #[instrument(skip(self))]
    pub async fn run_cycle(&self) -> Result<CycleOutcome, CycleError> {
        let result = self.run_cycle_inner().await;

        let label = match &result {
            Ok(CycleOutcome::Idle) => "idle",
            Ok(CycleOutcome::Published(_)) => "published",
            Err(_) => "failed",
        };
        metrics::counter!("dispatch_cycles_total", "result" => label).increment(1);
        result
    }

    async fn run_cycle_inner(&self) -> Result<CycleOutcome, CycleError> {
        let targets = self.resolve_targets().await?;
        if targets.is_empty() {
            info!("No active endpoints to probe");
            return Ok(CycleOutcome::Idle);
        }

        let correlation = format!("{}_{}", self.settings.correlation_prefix, targets.len());
        let ticket = self.runner.open(&correlation);
        info!("Dispatching batch {} with {} targets", ticket.id, targets.len());

        let report = self
            .runner
            .execute(ticket, &targets, &self.transport, self.settings.max_concurrent)
            .await?;
        Ok(CycleOutcome::Published(report))
    }

    /// 启动调度器后台任务
    ///
    /// 每次触发都派生独立的周期任务，允许周期重叠
    ///
    /// # 返回值
    ///
    /// 返回后台任务的句柄
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        let period = Duration::from_secs(self.settings.interval_secs.max(1));

        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!("Dispatch scheduler started, interval {:?}", period);

            loop {
                ticker.tick().await;
                let scheduler = self.clone();
                tokio::spawn(async move {
                    match scheduler.run_cycle().await {
                        Ok(CycleOutcome::Idle) => debug!("Dispatch cycle idle"),
                        Ok(CycleOutcome::Published(report)) => info!(
                            "Dispatch cycle published {}: {}/{} successful",
                            report.batch_id, report.summary.successful, report.summary.total
                        ),
                        Err(e) => error!("Dispatch cycle failed: {}", e),
                    }
                });
            }
        })
    }
}
