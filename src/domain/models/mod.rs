// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心数据结构，包括：
/// - 探测目标（target）：一个调度周期内待探测的URL
/// - 诊断记录（diagnostic）：单个目标的完整探测结果
/// - 批次（batch）：一个周期内全部诊断记录及汇总统计
/// - 告警（alert）：发往旁路通道的通知内容
pub mod alert;
pub mod batch;
pub mod diagnostic;
pub mod target;
