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
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::domain::models::diagnostic::DiagnosticRecord;
use crate::domain::models::target::Target;
use crate::domain::services::notifier::Notifier;

/// 探测错误类型
///
/// 只在引擎内部流转，最终都折叠进诊断记录
#[derive(Error, Debug)]
pub enum ProbeError {
    /// URL无法解析
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// 不支持的协议
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
    /// 传输层错误
    #[error("Connection error: {0}")]
    Transport(#[from] reqwest::Error),
    /// 重定向次数超限
    #[error("Too many redirects (limit {0})")]
    TooManyRedirects(usize),
    /// 超时
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
    /// 客户端构建失败
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl ProbeError {
    /// 是否属于传输层失败（连接、超时、重定向）
    ///
    /// 非传输层失败（URL无效等）同样会触发告警，但文案不同
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ProbeError::Transport(_) | ProbeError::TooManyRedirects(_) | ProbeError::Timeout(_)
        )
    }
}

/// 共享传输配置
///
/// 每个周期一份，由并发控制器持有
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// 单次探测的超时时间
    pub timeout: Duration,
    /// 辅助检查的超时时间
    pub auxiliary_timeout: Duration,
    /// 最大重定向跳数
    pub max_redirects: usize,
    /// User-Agent
    pub user_agent: String,
    /// 是否获取TLS会话信息
    pub inspect_tls: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            auxiliary_timeout: Duration::from_secs(10),
            max_redirects: 10,
            user_agent: concat!("probewatch/", env!("CARGO_PKG_VERSION")).to_string(),
            inspect_tls: true,
        }
    }
}

/// 探测引擎特质
#[async_trait]
pub trait ProbeEngine: Send + Sync {
    /// 探测单个目标
    ///
    /// 永不失败：所有错误都编码进返回的诊断记录
    async fn probe(&self, target: &Target) -> DiagnosticRecord;

    /// 引擎名称
    fn name(&self) -> &'static str;
}

/// 探测引擎工厂
///
/// 每个周期构建一个新引擎，连接池随周期结束而释放
pub trait ProbeEngineFactory: Send + Sync {
    fn build(
        &self,
        config: &TransportConfig,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Arc<dyn ProbeEngine>, ProbeError>;
}
