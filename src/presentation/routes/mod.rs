// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::use_cases::probe_cycle::ProbeCycleRunner;
use crate::config::settings::Settings;
use crate::presentation::handlers::probe_handler;
use crate::queue::scheduler::DispatchScheduler;
use axum::{
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// 创建应用路由
///
/// 处理器依赖通过 `Extension` 层注入：
/// `Arc<ProbeCycleRunner>`、`Arc<Settings>`、`Option<Arc<DispatchScheduler>>`
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes() -> Router {
    let public_routes = Router::new()
        .route("/", get(service_info))
        .route("/health", get(health_check))
        .route("/v1/version", get(version));

    let api_routes = Router::new()
        .route("/api/v1/test-endpoints", post(probe_handler::test_endpoints))
        .route("/api/v1/dispatch", post(probe_handler::dispatch_now));

    Router::new().merge(public_routes).merge(api_routes)
}

/// 创建带依赖注入与请求追踪的完整应用
///
/// # 参数
///
/// * `runner` - 探测周期执行器
/// * `settings` - 应用配置
/// * `scheduler` - 调度器，未配置目标存储时为 `None`
pub fn app(
    runner: Arc<ProbeCycleRunner>,
    settings: Arc<Settings>,
    scheduler: Option<Arc<DispatchScheduler>>,
) -> Router {
    routes()
        .layer(Extension(runner))
        .layer(Extension(settings))
        .layer(Extension(scheduler))
        .layer(TraceLayer::new_for_http())
}

/// 服务描述端点
pub async fn service_info() -> Json<Value> {
    Json(json!({
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "test": "/api/v1/test-endpoints",
            "dispatch": "/api/v1/dispatch",
            "health": "/health"
        }
    }))
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
///
/// # 返回值
///
/// 返回应用版本号
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
