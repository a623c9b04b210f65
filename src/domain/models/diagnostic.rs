// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

use super::target::Target;

/// 单个目标的诊断记录
///
/// 由探测引擎产出，返回给并发控制器后不再修改。
/// 无论探测成功与否，每个目标都恰好对应一条记录。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    /// 目标URL
    pub url: String,
    /// 资源ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<Uuid>,
    /// 端点ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_id: Option<Uuid>,
    /// 用户ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    /// 探测时间
    pub timestamp: DateTime<Utc>,
    /// 是否成功（200 ≤ status < 400）
    pub success: bool,
    /// 错误描述
    pub error: Option<String>,
    /// 从发出请求到收到完整响应头的耗时（毫秒）
    pub response_time_ms: Option<f64>,
    /// HTTP状态码，连接失败时为空
    pub status_code: Option<u16>,
    /// 响应内容类型
    pub content_type: Option<String>,
    /// 响应内容长度
    pub content_length: Option<u64>,
    /// 原始响应头
    pub headers: BTreeMap<String, String>,
    /// 最终URL是否为HTTPS
    pub is_https: bool,
    /// 推断出的技术栈（去重）
    pub technology_stack: BTreeSet<String>,
    /// 安全响应头
    pub security_headers: SecurityHeaders,
    /// 按内容类型分类的内容分析
    pub content_analysis: Option<ContentAnalysis>,
    /// 重定向链（按遍历顺序）
    pub redirect_chain: Vec<String>,
    /// 辅助资源检查
    pub additional_checks: Option<AuxiliaryChecks>,
    /// TLS会话信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_info: Option<TlsInfo>,
}

impl DiagnosticRecord {
    /// 为目标创建尚未填充的记录
    pub fn new(target: &Target) -> Self {
        Self {
            url: target.url.clone(),
            resource_id: target.resource_id,
            endpoint_id: target.endpoint_id,
            user_id: target.user_id,
            timestamp: Utc::now(),
            success: false,
            error: None,
            response_time_ms: None,
            status_code: None,
            content_type: None,
            content_length: None,
            headers: BTreeMap::new(),
            is_https: false,
            technology_stack: BTreeSet::new(),
            security_headers: SecurityHeaders::default(),
            content_analysis: None,
            redirect_chain: Vec::new(),
            additional_checks: None,
            ssl_info: None,
        }
    }

    /// 合成失败记录
    ///
    /// 用于探测本身无法执行或中途中止的情况
    pub fn failed(target: &Target, error: impl Into<String>) -> Self {
        let mut record = Self::new(target);
        record.error = Some(error.into());
        record
    }

    /// 检查记录是否满足终态约束
    ///
    /// 成功意味着状态码存在且位于 [200, 400)；失败意味着存在错误描述
    pub fn is_consistent(&self) -> bool {
        if self.success {
            matches!(self.status_code, Some(code) if (200..400).contains(&code))
        } else {
            self.error.is_some()
        }
    }
}

/// 安全响应头映射
///
/// 键为小写头名，值为头的取值（缺失时为空）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecurityHeaders(BTreeMap<String, Option<String>>);

impl SecurityHeaders {
    pub fn new(entries: BTreeMap<String, Option<String>>) -> Self {
        Self(entries)
    }

    /// 获取指定头的取值
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(|v| v.as_deref())
    }

    /// 指定头是否存在
    pub fn is_present(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// 已存在的头名称
    pub fn present(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(|(_, v)| v.is_some())
            .map(|(k, _)| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 内容分析结果
///
/// 按声明的MIME族区分，每条记录最多一种分析结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentAnalysis {
    Html(HtmlAnalysis),
    Json(JsonAnalysis),
    Text(TextAnalysis),
    Xml(XmlAnalysis),
    /// 不支持分析的内容类型
    Unknown { mime: String },
    /// 读取或分析响应体失败
    Failed { error: String },
}

/// HTML分析
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlAnalysis {
    pub title: Option<String>,
    /// name/property/http-equiv（小写）→ content
    pub meta_tags: BTreeMap<String, Option<String>>,
    pub element_count: ElementCount,
}

/// HTML元素计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementCount {
    pub links: usize,
    pub images: usize,
    pub scripts: usize,
    pub stylesheets: usize,
    pub forms: usize,
}

/// JSON分析
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonAnalysis {
    pub json_valid: bool,
    /// 顶层为对象时的键集合
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_keys: Option<Vec<String>>,
    /// 顶层非对象时的类型名
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_type: Option<String>,
    /// 对象为重新序列化后的大小，其它为原始字节数
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_size: Option<usize>,
}

/// 纯文本分析
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextAnalysis {
    pub line_count: usize,
    pub word_count: usize,
    pub character_count: usize,
}

/// XML分析
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XmlAnalysis {
    pub xml_size: usize,
    pub has_xml_declaration: bool,
}

/// 辅助资源检查结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxiliaryChecks {
    pub robots_txt: AuxiliaryResult,
    pub sitemap_xml: AuxiliaryResult,
    pub favicon: AuxiliaryResult,
}

/// 单个辅助资源的检查结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuxiliaryResult {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl AuxiliaryResult {
    /// 检查失败时的降级结果
    pub fn missing() -> Self {
        Self::default()
    }
}

/// TLS会话信息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cipher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
