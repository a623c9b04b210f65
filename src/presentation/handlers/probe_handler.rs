// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use validator::Validate;

use crate::{
    application::{
        dto::probe_request::{ProbeAcceptedDto, ProbeRequestDto},
        use_cases::probe_cycle::ProbeCycleRunner,
    },
    config::settings::Settings,
    domain::{
        models::{alert::AlertEvent, target::Target},
        repositories::target_repository::RepositoryError,
        services::notifier::emit_alert,
    },
    presentation::errors::AppError,
    queue::scheduler::DispatchScheduler,
};

/// 同步入口的服务名，用于服务错误告警
const SERVICE_NAME: &str = "test-endpoints";

/// 受理一批URL的探测请求
///
/// 发布端在探测开始前不可达时返回 503；
/// 受理后探测与发布在后台继续，立即返回 202
pub async fn test_endpoints(
    Extension(runner): Extension<Arc<ProbeCycleRunner>>,
    Extension(settings): Extension<Arc<Settings>>,
    Json(payload): Json<ProbeRequestDto>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let publisher = runner.publication().publisher().clone();
    if let Err(e) = publisher.ping().await {
        warn!("Publisher unreachable, rejecting request: {}", e);
        return Err(e.into());
    }

    let targets: Vec<Target> = payload.urls.iter().map(Target::from_url).collect();
    let total_urls = targets.len();
    let concurrency = payload
        .max_concurrent
        .unwrap_or(settings.probe.max_concurrent);
    let transport = settings
        .probe
        .transport(payload.timeout.unwrap_or(settings.probe.timeout_secs));

    let ticket = runner.open(&format!("test_{}", total_urls));
    let batch_id = ticket.id.to_string();
    info!("Accepted batch {} with {} urls", batch_id, total_urls);

    let background = runner.clone();
    tokio::spawn(async move {
        if let Err(e) = background
            .execute(ticket, &targets, &transport, concurrency)
            .await
        {
            error!("Background probe cycle failed: {}", e);
            let alert = AlertEvent::ServiceError {
                service: SERVICE_NAME.to_string(),
                error: e.to_string(),
            };
            emit_alert(background.notifier().as_ref(), &alert).await;
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(ProbeAcceptedDto {
            message: format!("Testing {} endpoints in background", total_urls),
            total_urls,
            topic: publisher.topic().to_string(),
            batch_id,
        }),
    ))
}

/// 立即执行一次调度周期并返回结果
pub async fn dispatch_now(
    Extension(scheduler): Extension<Option<Arc<DispatchScheduler>>>,
) -> Result<impl IntoResponse, AppError> {
    let scheduler = scheduler.ok_or(RepositoryError::NotConfigured)?;
    let outcome = scheduler.run_cycle().await?;
    Ok(Json(outcome))
}
