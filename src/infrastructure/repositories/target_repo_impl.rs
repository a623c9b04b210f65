// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::target::EndpointRow;
use crate::domain::repositories::target_repository::{RepositoryError, TargetRepository};
use crate::infrastructure::database::entities::{endpoint, resource, user_selected_endpoint};
use async_trait::async_trait;
use sea_orm::*;
use std::sync::Arc;
use uuid::Uuid;

/// 连接查询的结果行
#[derive(Debug, FromQueryResult)]
struct ActiveEndpointRow {
    endpoint_id: Uuid,
    resource_id: Uuid,
    user_id: Uuid,
    resource_url: String,
    path: String,
    method: String,
    is_active: bool,
}

impl From<ActiveEndpointRow> for EndpointRow {
    fn from(row: ActiveEndpointRow) -> Self {
        Self {
            endpoint_id: row.endpoint_id,
            resource_id: row.resource_id,
            user_id: row.user_id,
            resource_base_url: row.resource_url,
            path: row.path,
            method: row.method,
            is_active: row.is_active,
        }
    }
}

/// 目标仓库实现
#[derive(Clone)]
pub struct TargetRepoImpl {
    db: Arc<DatabaseConnection>,
}

impl TargetRepoImpl {
    /// 创建新的目标仓库实现
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TargetRepository for TargetRepoImpl {
    async fn find_active_endpoints(&self) -> Result<Vec<EndpointRow>, RepositoryError> {
        let rows = user_selected_endpoint::Entity::find()
            .select_only()
            .column_as(user_selected_endpoint::Column::EndpointId, "endpoint_id")
            .column_as(user_selected_endpoint::Column::UserId, "user_id")
            .column_as(user_selected_endpoint::Column::IsActive, "is_active")
            .column_as(endpoint::Column::ResourceId, "resource_id")
            .column_as(endpoint::Column::Path, "path")
            .column_as(endpoint::Column::Method, "method")
            .column_as(resource::Column::Url, "resource_url")
            .join(JoinType::InnerJoin, user_selected_endpoint::Relation::Endpoint.def())
            .join(JoinType::InnerJoin, endpoint::Relation::Resource.def())
            .filter(user_selected_endpoint::Column::IsActive.eq(true))
            .into_model::<ActiveEndpointRow>()
            .all(self.db.as_ref())
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
