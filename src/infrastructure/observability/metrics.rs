// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

use crate::config::settings::MetricsSettings;

/// 初始化指标系统
///
/// 安装 Prometheus 导出器并注册探测相关指标。
/// 安装失败（地址无效、端口占用、重复安装）只记录警告，不影响服务启动。
pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        info!("Metrics exporter disabled");
        return;
    }

    let addr: SocketAddr = match settings.listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics address {}: {}", settings.listen_addr, e);
            return;
        }
    };

    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!("Failed to install Prometheus recorder: {}. This might happen if the port is already in use.", e);
        return;
    }
    info!("Metrics exporter listening on {}", addr);

    describe_metrics();
}

fn describe_metrics() {
    describe_counter!(
        "probe_requests_total",
        "Total number of endpoint probes by outcome"
    );
    describe_counter!(
        "probe_alerts_failed_total",
        "Total number of alerts the notifier failed to deliver"
    );
    describe_counter!(
        "batches_published_total",
        "Total number of batches written to the result stream"
    );
    describe_counter!(
        "batches_publish_failed_total",
        "Total number of batches that could not be published"
    );
    describe_counter!(
        "dispatch_cycles_total",
        "Total number of dispatch cycles by result"
    );
    describe_histogram!(
        "probe_duration_seconds",
        Unit::Seconds,
        "Wall-clock duration of a single endpoint probe"
    );
}
