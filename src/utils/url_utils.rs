// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use reqwest::header::{HeaderMap, LOCATION};
use url::{ParseError, Url};

/// 拼接资源基础URL与端点路径
///
/// 拼接处恰好保留一个斜杠；路径为空时直接返回基础URL。
/// 基础URL为空时无法构造目标，返回 `None`。
pub fn join_base_and_path(base: &str, path: &str) -> Option<String> {
    let base = base.trim().trim_end_matches('/');
    let path = path.trim().trim_start_matches('/');

    match (base.is_empty(), path.is_empty()) {
        (true, _) => None,
        (false, true) => Some(base.to_string()),
        (false, false) => Some(format!("{}/{}", base, path)),
    }
}

/// 解析 `Location` 头，得到重定向的下一跳
///
/// 相对地址基于当前URL解析
pub fn redirect_target(current: &Url, headers: &HeaderMap) -> Option<Url> {
    let location = headers.get(LOCATION)?.to_str().ok()?;
    current.join(location.trim()).ok()
}

/// 以目标源（scheme://host:port）为基准构造辅助资源URL
pub fn origin_resource(target: &Url, resource: &str) -> Result<Url, ParseError> {
    let origin = target.origin().ascii_serialization();
    Url::parse(&origin)?.join(resource)
}
