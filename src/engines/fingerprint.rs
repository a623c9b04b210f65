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

use reqwest::header::HeaderMap;
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::models::diagnostic::SecurityHeaders;

/// 需要检查的安全响应头
pub const SECURITY_HEADERS: &[&str] = &[
    "strict-transport-security",
    "x-content-type-options",
    "x-frame-options",
    "x-xss-protection",
    "content-security-policy",
    "referrer-policy",
    "permissions-policy",
    "access-control-allow-origin",
    "access-control-allow-methods",
];

/// `Server` 头的技术特征
const SERVER_PATTERNS: &[(&str, &str)] = &[
    ("nginx", "nginx"),
    ("apache", "apache"),
    ("iis", "iis"),
    ("cloudflare", "cloudflare"),
];

/// `X-Powered-By` 头的技术特征
const POWERED_BY_PATTERNS: &[(&str, &str)] = &[
    ("php", "php"),
    ("asp.net", "asp.net"),
    ("node", "node.js"),
    ("express", "express"),
];

/// HTML正文中的框架/CMS特征
const CONTENT_PATTERNS: &[(&str, &[&str])] = &[
    ("wordpress", &["wp-content", "wp-includes", "wordpress"]),
    ("drupal", &["drupal", "sites/all"]),
    ("joomla", &["joomla", "media/jui"]),
    ("react", &["react", "react-dom"]),
    ("vue", &["vue.js", "vue@"]),
    ("angular", &["angular", "ng-"]),
    ("jquery", &["jquery", "$()."]),
    ("bootstrap", &["bootstrap", "btn-primary"]),
];

fn header_lower(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_lowercase)
        .unwrap_or_default()
}

/// 按固定头列表构建安全头映射
pub fn security_headers(headers: &HeaderMap) -> SecurityHeaders {
    let entries: BTreeMap<String, Option<String>> = SECURITY_HEADERS
        .iter()
        .map(|name| {
            let value = headers
                .get(*name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            (name.to_string(), value)
        })
        .collect();
    SecurityHeaders::new(entries)
}

/// 从响应头推断技术栈
///
/// 各特征相互独立，命中即追加
pub fn header_technologies(headers: &HeaderMap) -> BTreeSet<String> {
    let mut tags = BTreeSet::new();

    let server = header_lower(headers, "server");
    for (pattern, tag) in SERVER_PATTERNS {
        if server.contains(pattern) {
            tags.insert(tag.to_string());
        }
    }

    let powered_by = header_lower(headers, "x-powered-by");
    for (pattern, tag) in POWERED_BY_PATTERNS {
        if powered_by.contains(pattern) {
            tags.insert(tag.to_string());
        }
    }

    // X-Generator: first token only, e.g. "Drupal 10 (https://www.drupal.org)"
    if let Some(generator) = header_lower(headers, "x-generator")
        .split_whitespace()
        .next()
    {
        tags.insert(generator.to_string());
    }

    tags
}

/// 扫描小写化后的HTML正文，返回命中的框架/CMS
pub fn content_technologies(html: &str) -> BTreeSet<String> {
    let lowered = html.to_lowercase();
    CONTENT_PATTERNS
        .iter()
        .filter(|(_, indicators)| indicators.iter().any(|i| lowered.contains(i)))
        .map(|(tag, _)| tag.to_string())
        .collect()
}
