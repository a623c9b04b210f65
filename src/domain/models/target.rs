// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::url_utils;

/// 目标存储中的端点行
///
/// 对应 `user_selected_endpoints` ⨝ `endpoints` ⨝ `resources` 的一行只读结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRow {
    /// 端点ID
    pub endpoint_id: Uuid,
    /// 资源ID
    pub resource_id: Uuid,
    /// 订阅该端点的用户ID
    pub user_id: Uuid,
    /// 资源基础URL
    pub resource_base_url: String,
    /// 端点路径
    pub path: String,
    /// HTTP方法（仅作记录，探测始终使用GET）
    pub method: String,
    /// 是否处于监控状态
    pub is_active: bool,
}

/// 探测目标
///
/// 每个调度周期从外部存储重新解析，周期结束即丢弃
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// 绝对URL
    pub url: String,
    /// 资源ID，用于下游关联
    pub resource_id: Option<Uuid>,
    /// 端点ID，用于下游关联
    pub endpoint_id: Option<Uuid>,
    /// 所属用户ID
    pub user_id: Option<Uuid>,
}

impl Target {
    /// 由裸URL创建目标（同步接口使用，无关联ID）
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            resource_id: None,
            endpoint_id: None,
            user_id: None,
        }
    }

    /// 由存储行构建目标
    ///
    /// # 返回值
    ///
    /// 基础URL缺失时无法构造绝对URL，返回 `None`
    pub fn from_row(row: &EndpointRow) -> Option<Self> {
        let url = url_utils::join_base_and_path(&row.resource_base_url, &row.path)?;
        Some(Self {
            url,
            resource_id: Some(row.resource_id),
            endpoint_id: Some(row.endpoint_id),
            user_id: Some(row.user_id),
        })
    }
}
