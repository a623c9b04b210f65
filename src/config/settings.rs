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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::engines::traits::TransportConfig;

/// 应用程序配置设置
///
/// 包含服务器、目标存储、下游流、探测、调度、通知与可观测性等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// 数据库配置
    pub database: DatabaseSettings,
    /// Redis配置
    pub redis: RedisSettings,
    /// 下游流配置
    pub stream: StreamSettings,
    /// 探测配置
    pub probe: ProbeSettings,
    /// 周期调度配置
    pub dispatch: DispatchSettings,
    /// 告警通知配置
    pub notifier: NotifierSettings,
    /// 日志配置
    pub telemetry: TelemetrySettings,
    /// 指标配置
    pub metrics: MetricsSettings,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 数据库配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL，未配置时不启动周期调度
    pub url: Option<String>,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
}

/// Redis配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    /// Redis连接URL
    pub url: String,
}

/// 下游流配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct StreamSettings {
    /// 流名称
    pub topic: String,
    /// 等待确认的超时时间（秒）
    pub send_timeout_secs: u64,
    /// 近似裁剪长度
    pub max_len: Option<usize>,
}

/// 探测配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeSettings {
    /// 同步接口的默认并发上限
    pub max_concurrent: usize,
    /// 同步接口的默认超时时间（秒）
    pub timeout_secs: u64,
    /// 辅助检查超时时间（秒）
    pub auxiliary_timeout_secs: u64,
    /// 最大重定向跳数
    pub max_redirects: usize,
    /// User-Agent
    pub user_agent: String,
    /// 是否获取TLS会话信息
    pub inspect_tls: bool,
}

impl ProbeSettings {
    /// 构建传输配置
    ///
    /// # 参数
    ///
    /// * `timeout_secs` - 本次使用的单探测超时
    pub fn transport(&self, timeout_secs: u64) -> TransportConfig {
        TransportConfig {
            timeout: Duration::from_secs(timeout_secs),
            auxiliary_timeout: Duration::from_secs(self.auxiliary_timeout_secs),
            max_redirects: self.max_redirects,
            user_agent: self.user_agent.clone(),
            inspect_tls: self.inspect_tls,
        }
    }
}

/// 周期调度配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchSettings {
    /// 是否启用周期调度
    pub enabled: bool,
    /// 调度间隔（秒）
    pub interval_secs: u64,
    /// 周期内并发上限
    pub max_concurrent: usize,
    /// 周期内单探测超时（秒）
    pub timeout_secs: u64,
    /// 批次标识的关联前缀
    pub correlation_prefix: String,
}

/// 告警通知配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct NotifierSettings {
    /// 是否启用
    pub enabled: bool,
    /// Bot API 基础地址
    pub api_base: String,
    /// Bot 令牌
    pub bot_token: Option<String>,
    /// 目标会话
    pub chat_id: Option<String>,
    /// 请求超时（秒）
    pub timeout_secs: u64,
    /// 消息解析模式
    pub parse_mode: String,
}

/// 日志配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    /// 是否输出JSON格式日志
    pub json: bool,
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启用Prometheus导出
    pub enabled: bool,
    /// 导出监听地址
    pub listen_addr: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加内置默认值、`config/default`、`config/{APP_ENVIRONMENT}` 与 `PROBEWATCH__*` 环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        Self::load("PROBEWATCH")
    }

    /// 以指定环境变量前缀加载配置
    pub fn load(env_prefix: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8020)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            .set_default("redis.url", "redis://127.0.0.1:6379/0")?
            .set_default("stream.topic", "endpoint_test_results")?
            .set_default("stream.send_timeout_secs", 10)?
            .set_default("probe.max_concurrent", 20)?
            .set_default("probe.timeout_secs", 15)?
            .set_default("probe.auxiliary_timeout_secs", 10)?
            .set_default("probe.max_redirects", 10)?
            .set_default(
                "probe.user_agent",
                concat!("probewatch/", env!("CARGO_PKG_VERSION")),
            )?
            .set_default("probe.inspect_tls", true)?
            .set_default("dispatch.enabled", true)?
            .set_default("dispatch.interval_secs", 60)?
            .set_default("dispatch.max_concurrent", 20)?
            .set_default("dispatch.timeout_secs", 30)?
            .set_default("dispatch.correlation_prefix", "cycle")?
            .set_default("notifier.enabled", false)?
            .set_default("notifier.api_base", "https://api.telegram.org")?
            .set_default("notifier.timeout_secs", 10)?
            .set_default("notifier.parse_mode", "HTML")?
            .set_default("telemetry.json", false)?
            .set_default("metrics.enabled", true)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix(env_prefix)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
