// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use futures::FutureExt;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::domain::models::diagnostic::DiagnosticRecord;
use crate::domain::models::target::Target;
use crate::engines::traits::ProbeEngine;

/// 探测工作池
///
/// 固定数量的工作协程从共享队列中取目标，任意时刻最多有 `concurrency` 个探测在进行。
/// 结果按目标顺序返回，而非完成顺序。
pub struct ProbePool {
    engine: Arc<dyn ProbeEngine>,
    concurrency: usize,
}

impl ProbePool {
    /// 创建工作池
    ///
    /// # 参数
    ///
    /// * `engine` - 本周期独占的探测引擎
    /// * `concurrency` - 并发上限，至少为1
    pub fn new(engine: Arc<dyn ProbeEngine>, concurrency: usize) -> Self {
        Self {
            engine,
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// 探测全部目标
    ///
    /// 等待所有目标完成后才返回；返回的记录数恒等于目标数
    pub async fn run(&self, targets: &[Target]) -> Vec<DiagnosticRecord> {
        let total = targets.len();
        if total == 0 {
            return Vec::new();
        }

        let queue: Arc<Mutex<VecDeque<(usize, Target)>>> =
            Arc::new(Mutex::new(targets.iter().cloned().enumerate().collect()));
        let (tx, mut rx) = mpsc::channel::<(usize, DiagnosticRecord)>(total);

        let workers = self.concurrency.min(total);
        debug!("Starting {} probe workers for {} targets", workers, total);

        let handles: Vec<JoinHandle<()>> = (0..workers)
            .map(|worker_id| {
                let queue = queue.clone();
                let tx = tx.clone();
                let engine = self.engine.clone();
                tokio::spawn(async move {
                    loop {
                        let next = queue.lock().pop_front();
                        let Some((index, target)) = next else {
                            break;
                        };

                        let record = match AssertUnwindSafe(engine.probe(&target))
                            .catch_unwind()
                            .await
                        {
                            Ok(record) => record,
                            Err(_) => {
                                error!("Worker {} panicked probing {}", worker_id, target.url);
                                DiagnosticRecord::failed(&target, "Unexpected error: probe panicked")
                            }
                        };

                        if tx.send((index, record)).await.is_err() {
                            break;
                        }
                    }
                })
            })
            .collect();
        drop(tx);

        let mut slots: Vec<Option<DiagnosticRecord>> = (0..total).map(|_| None).collect();
        while let Some((index, record)) = rx.recv().await {
            slots[index] = Some(record);
        }

        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Probe worker terminated abnormally: {}", e);
            }
        }

        slots
            .into_iter()
            .zip(targets)
            .map(|(slot, target)| {
                slot.unwrap_or_else(|| {
                    DiagnosticRecord::failed(target, "Probe could not be scheduled: worker aborted")
                })
            })
            .collect()
    }
}
