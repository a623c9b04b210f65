// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Local};
use html_escape::encode_text;
use std::fmt::Write;

use super::batch::BatchSummary;

/// 告警紧急程度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    /// 汇总类信息
    Info,
    /// 需要立即关注
    Critical,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Info => "info",
            Urgency::Critical => "critical",
        }
    }
}

/// 告警事件
///
/// 不持久化，发送结果不影响批次与诊断记录
#[derive(Debug, Clone, PartialEq)]
pub enum AlertEvent {
    /// 单个端点出错（状态500或传输异常）
    EndpointError {
        url: String,
        /// 非HTTP失败时为0
        status: u16,
        error: Option<String>,
    },
    /// 批次汇总
    Summary(BatchSummary),
    /// 服务级错误
    ServiceError { service: String, error: String },
}

impl AlertEvent {
    pub fn endpoint_error(url: impl Into<String>, status: u16, error: Option<String>) -> Self {
        AlertEvent::EndpointError {
            url: url.into(),
            status,
            error,
        }
    }

    pub fn urgency(&self) -> Urgency {
        match self {
            AlertEvent::Summary(_) => Urgency::Info,
            AlertEvent::EndpointError { .. } | AlertEvent::ServiceError { .. } => {
                Urgency::Critical
            }
        }
    }

    /// 渲染为HTML文本（所有插值均转义）
    pub fn render(&self) -> String {
        self.render_at(Local::now())
    }

    pub fn render_at(&self, now: DateTime<Local>) -> String {
        let mut text = String::new();

        match self {
            AlertEvent::EndpointError { url, status, error } => {
                text.push_str("🚨 <b>Endpoint error</b>\n\n");
                let _ = writeln!(text, "🔗 <b>URL:</b> <code>{}</code>", encode_text(url));
                let _ = writeln!(text, "📊 <b>Status:</b> <code>{}</code>", status);
                if let Some(error) = error {
                    let _ = writeln!(text, "❌ <b>Error:</b> <code>{}</code>", encode_text(error));
                }
            }
            AlertEvent::Summary(summary) => {
                text.push_str("📊 <b>Monitoring summary</b>\n\n");
                let _ = writeln!(text, "🔗 <b>Total URLs:</b> <code>{}</code>", summary.total);
                let _ = writeln!(text, "✅ <b>Successful:</b> <code>{}</code>", summary.successful);
                let _ = writeln!(text, "❌ <b>Failed:</b> <code>{}</code>", summary.failed);
                if summary.successful > 0 {
                    let _ = writeln!(
                        text,
                        "⏱️ <b>Mean response time:</b> <code>{:.3}s</code>",
                        summary.mean_elapsed_ms / 1000.0
                    );
                }
                let _ = writeln!(
                    text,
                    "📈 <b>Success rate:</b> <code>{:.1}%</code>",
                    summary.success_rate()
                );
            }
            AlertEvent::ServiceError { service, error } => {
                text.push_str("🚨 <b>Service error</b>\n\n");
                let _ = writeln!(text, "🔧 <b>Service:</b> <code>{}</code>", encode_text(service));
                let _ = writeln!(text, "❌ <b>Error:</b> <code>{}</code>", encode_text(error));
            }
        }

        let _ = write!(text, "\n⏰ <b>Time:</b> {}", now.format("%Y-%m-%d %H:%M:%S"));
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_error_escapes_interpolations() {
        let alert = AlertEvent::endpoint_error(
            "http://x.test/?a=<b>&c",
            0,
            Some("connect <refused>".into()),
        );
        let text = alert.render();

        assert!(text.contains("http://x.test/?a=&lt;b&gt;&amp;c"));
        assert!(text.contains("connect &lt;refused&gt;"));
        assert!(text.contains("<code>0</code>"));
        assert_eq!(alert.urgency(), Urgency::Critical);
    }

    #[test]
    fn test_summary_omits_mean_without_successes() {
        let summary = BatchSummary {
            total: 2,
            successful: 0,
            failed: 2,
            mean_elapsed_ms: 0.0,
        };
        let text = AlertEvent::Summary(summary).render();
        assert!(!text.contains("Mean response time"));
        assert!(text.contains("<code>0.0%</code>"));
    }

    #[test]
    fn test_summary_reports_mean_in_seconds() {
        let summary = BatchSummary {
            total: 3,
            successful: 2,
            failed: 1,
            mean_elapsed_ms: 200.0,
        };
        let text = AlertEvent::Summary(summary).render();
        assert!(text.contains("<code>0.200s</code>"));
        assert!(text.contains("<code>66.7%</code>"));
    }
}
