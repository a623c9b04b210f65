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

use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::domain::models::diagnostic::{AuxiliaryChecks, AuxiliaryResult};
use crate::utils::url_utils::origin_resource;

/// 对目标源执行 robots.txt、sitemap.xml、favicon.ico 三项检查
///
/// 三项检查相互独立，各自带超时；任何失败都降级为 `exists: false`
pub async fn check_origin(client: &Client, target: &Url, timeout: Duration) -> AuxiliaryChecks {
    AuxiliaryChecks {
        robots_txt: check(client, target, "/robots.txt", timeout, false).await,
        sitemap_xml: check(client, target, "/sitemap.xml", timeout, false).await,
        favicon: check(client, target, "/favicon.ico", timeout, true).await,
    }
}

async fn check(
    client: &Client,
    target: &Url,
    resource: &str,
    timeout: Duration,
    with_size: bool,
) -> AuxiliaryResult {
    let url = match origin_resource(target, resource) {
        Ok(url) => url,
        Err(e) => {
            debug!("Cannot build {} for {}: {}", resource, target, e);
            return AuxiliaryResult::missing();
        }
    };

    match client.get(url.clone()).timeout(timeout).send().await {
        Ok(response) => {
            let headers = response.headers();
            let content_type = headers
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let size = if with_size {
                headers
                    .get(CONTENT_LENGTH)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok())
            } else {
                None
            };

            AuxiliaryResult {
                exists: response.status() == StatusCode::OK,
                status_code: Some(response.status().as_u16()),
                content_type,
                size,
            }
        }
        Err(e) => {
            debug!("Auxiliary check {} failed: {}", url, e);
            AuxiliaryResult::missing()
        }
    }
}
