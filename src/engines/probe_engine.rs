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

use async_trait::async_trait;
use bytes::Bytes;
use futures::FutureExt;
use reqwest::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::redirect::Policy;
use reqwest::{Client, StatusCode};
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout_at, Instant as Deadline};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::domain::models::alert::AlertEvent;
use crate::domain::models::diagnostic::{ContentAnalysis, DiagnosticRecord};
use crate::domain::models::target::Target;
use crate::domain::services::notifier::{emit_alert, Notifier};
use crate::engines::traits::{ProbeEngine, ProbeEngineFactory, ProbeError, TransportConfig};
use crate::engines::{auxiliary, content_analysis, fingerprint, tls_inspector};
use crate::utils::url_utils::redirect_target;

/// 最终响应（重定向已跟随完毕）
struct Exchange {
    final_url: Url,
    status: StatusCode,
    headers: HeaderMap,
    elapsed_ms: f64,
    body: Result<Bytes, String>,
}

/// HTTP探测引擎
///
/// 基于reqwest实现，手动跟随重定向以记录完整的重定向链
pub struct HttpProbeEngine {
    /// 主探测客户端，不自动跟随重定向
    client: Client,
    /// 辅助检查客户端
    aux_client: Client,
    config: TransportConfig,
    notifier: Arc<dyn Notifier>,
}

impl HttpProbeEngine {
    /// 创建探测引擎
    ///
    /// # 参数
    ///
    /// * `config` - 传输配置
    /// * `notifier` - 告警通知器
    ///
    /// # 返回值
    ///
    /// * `Ok(HttpProbeEngine)` - 引擎实例
    /// * `Err(ProbeError::ClientBuild)` - HTTP客户端构建失败
    pub fn new(config: TransportConfig, notifier: Arc<dyn Notifier>) -> Result<Self, ProbeError> {
        // Idle connections are not pooled, so open sockets never outnumber in-flight probes.
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none())
            .danger_accept_invalid_certs(true)
            .pool_max_idle_per_host(0)
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| ProbeError::ClientBuild(e.to_string()))?;

        let aux_client = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(Policy::limited(config.max_redirects))
            .danger_accept_invalid_certs(true)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| ProbeError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            aux_client,
            config,
            notifier,
        })
    }

    fn parse_target(raw: &str) -> Result<Url, ProbeError> {
        let url = Url::parse(raw.trim()).map_err(|e| ProbeError::InvalidUrl(format!("{}: {}", raw, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ProbeError::UnsupportedScheme(other.to_string())),
        }
    }

    /// 执行主请求并跟随重定向
    ///
    /// 响应头与响应体共享同一个截止时间；响应体超时只影响内容分析
    async fn exchange(
        &self,
        url: Url,
        redirect_chain: &mut Vec<String>,
    ) -> Result<Exchange, ProbeError> {
        let deadline = Deadline::now() + self.config.timeout;
        let started = Instant::now();
        let mut current = url;

        let response = loop {
            let response = timeout_at(deadline, self.client.get(current.clone()).send())
                .await
                .map_err(|_| ProbeError::Timeout(self.config.timeout))??;

            if !response.status().is_redirection() {
                break response;
            }
            let Some(next) = redirect_target(&current, response.headers()) else {
                break response;
            };
            if redirect_chain.len() >= self.config.max_redirects {
                return Err(ProbeError::TooManyRedirects(self.config.max_redirects));
            }
            debug!("Following redirect {} -> {}", current, next);
            redirect_chain.push(current.to_string());
            current = next;
        };

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        let status = response.status();
        let headers = response.headers().clone();
        let body = match timeout_at(deadline, response.bytes()).await {
            Ok(Ok(bytes)) => Ok(bytes),
            Ok(Err(e)) => Err(format!("Failed to read body: {}", e)),
            Err(_) => Err(format!("Timed out reading body after {:?}", self.config.timeout)),
        };

        Ok(Exchange {
            final_url: current,
            status,
            headers,
            elapsed_ms,
            body,
        })
    }

    async fn alert(&self, url: &str, status: u16, error: Option<String>) {
        emit_alert(
            self.notifier.as_ref(),
            &AlertEvent::endpoint_error(url, status, error),
        )
        .await;
    }

    async fn fail(&self, mut record: DiagnosticRecord, error: String) -> DiagnosticRecord {
        self.alert(&record.url, 0, Some(error.clone())).await;
        record.error = Some(error);
        record
    }

    async fn probe_inner(&self, target: &Target) -> DiagnosticRecord {
        let mut record = DiagnosticRecord::new(target);

        let url = match Self::parse_target(&target.url) {
            Ok(url) => url,
            Err(e) => return self.fail(record, e.to_string()).await,
        };

        let exchange = match self.exchange(url.clone(), &mut record.redirect_chain).await {
            Ok(exchange) => exchange,
            Err(e) => {
                let error = if e.is_transport() {
                    e.to_string()
                } else {
                    format!("Unexpected error: {}", e)
                };
                return self.fail(record, error).await;
            }
        };

        let status = exchange.status.as_u16();
        let headers = &exchange.headers;
        record.response_time_ms = Some(exchange.elapsed_ms);
        record.status_code = Some(status);
        record.success = (200..400).contains(&status);
        record.is_https = exchange.final_url.scheme() == "https";
        record.content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        record.content_length = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());
        record.headers = flatten_headers(headers);
        record.security_headers = fingerprint::security_headers(headers);
        record.technology_stack = fingerprint::header_technologies(headers);

        if !record.success {
            record.error = Some(format!("HTTP {}", status));
        }
        if exchange.status == StatusCode::INTERNAL_SERVER_ERROR {
            warn!("Endpoint answered 500: {}", record.url);
            self.alert(&record.url, status, Some("Internal Server Error".to_string()))
                .await;
        }

        match (&exchange.body, record.content_type.as_deref()) {
            (Ok(body), Some(content_type)) if !body.is_empty() => {
                let outcome = content_analysis::analyze(body, content_type);
                record.technology_stack.extend(outcome.technologies);
                record.content_analysis = Some(outcome.analysis);
            }
            (Err(error), _) => {
                debug!("Content analysis skipped for {}: {}", record.url, error);
                record.content_analysis = Some(ContentAnalysis::Failed {
                    error: error.clone(),
                });
            }
            _ => {}
        }

        if record.is_https && self.config.inspect_tls {
            record.ssl_info =
                Some(tls_inspector::inspect(&exchange.final_url, self.config.auxiliary_timeout).await);
        }

        if record.success {
            record.additional_checks = Some(
                auxiliary::check_origin(&self.aux_client, &url, self.config.auxiliary_timeout)
                    .await,
            );
        }

        record
    }
}

/// 展平响应头，同名多值以逗号连接
fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut flat: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        flat.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    flat
}

#[async_trait]
impl ProbeEngine for HttpProbeEngine {
    /// 探测单个目标
    ///
    /// # 参数
    ///
    /// * `target` - 探测目标
    ///
    /// # 返回值
    ///
    /// 诊断记录，引擎内部的panic同样被转换为失败记录
    #[instrument(skip(self, target), fields(url = %target.url))]
    async fn probe(&self, target: &Target) -> DiagnosticRecord {
        let started = Instant::now();
        let record = match AssertUnwindSafe(self.probe_inner(target)).catch_unwind().await {
            Ok(record) => record,
            Err(_) => {
                let record = DiagnosticRecord::new(target);
                self.fail(record, "Unexpected error: probe panicked".to_string())
                    .await
            }
        };

        let outcome = if record.success { "success" } else { "failure" };
        metrics::counter!("probe_requests_total", "outcome" => outcome).increment(1);
        metrics::histogram!("probe_duration_seconds").record(started.elapsed().as_secs_f64());
        record
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// HTTP探测引擎工厂
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpProbeEngineFactory;

impl ProbeEngineFactory for HttpProbeEngineFactory {
    fn build(
        &self,
        config: &TransportConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Arc<dyn ProbeEngine>, ProbeError> {
        Ok(Arc::new(HttpProbeEngine::new(config.clone(), notifier)?))
    }
}

#[cfg(test)]
#[path = "probe_engine_test.rs"]
mod tests;
