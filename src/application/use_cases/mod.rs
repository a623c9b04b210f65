// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 用例模块
///
/// - 探测周期（probe_cycle）：扇出探测、组装批次并发布
/// - 批次发布（publish_batch）：单消息写入下游流并发送汇总告警
pub mod probe_cycle;
pub mod publish_batch;
