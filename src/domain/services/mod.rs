// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 批次聚合（aggregator）：分配批次标识并组装有序批次
/// - 通知器（notifier）：旁路告警通道的抽象与尽力发送
/// - 发布器（publisher）：下游流的抽象
pub mod aggregator;
pub mod notifier;
pub mod publisher;
