// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::target::EndpointRow;
use async_trait::async_trait;
use sea_orm::DbErr;
use thiserror::Error;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 存储未配置
    #[error("Target store is not configured")]
    NotConfigured,
}

/// 目标仓库特质
///
/// 只读访问外部的资源/端点存储，需容忍重叠周期的并发读取
#[async_trait]
pub trait TargetRepository: Send + Sync {
    /// 查询所有处于监控状态（`is_active = true`）的端点
    async fn find_active_endpoints(&self) -> Result<Vec<EndpointRow>, RepositoryError>;
}
