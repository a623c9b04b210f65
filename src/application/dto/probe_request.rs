// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// 探测请求DTO
///
/// 同步入口接受的参数；未给出的并发与超时使用配置默认值
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct ProbeRequestDto {
    /// 待探测的URL列表
    #[validate(length(min = 1, max = 10000))]
    pub urls: Vec<String>,

    /// 并发上限
    #[validate(range(min = 1, max = 500))]
    pub max_concurrent: Option<usize>,

    /// 单探测超时（秒）
    #[validate(range(min = 1, max = 300))]
    pub timeout: Option<u64>,
}

/// 探测请求的受理回执
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProbeAcceptedDto {
    pub message: String,
    pub total_urls: usize,
    pub topic: String,
    pub batch_id: String,
}
