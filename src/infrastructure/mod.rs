// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 该模块包含系统的技术实现细节，负责与外部系统的交互。
///
/// 包含的子模块：
/// - 数据库（database）：目标存储的连接和实体映射
/// - 可观测性（observability）：Prometheus 指标导出
/// - 仓库实现（repositories）：目标仓库接口的具体实现
/// - 服务（services）：告警通知器
/// - 流（stream）：批次发布到 Redis Streams
///
/// 基础设施层依赖于领域层的抽象接口，领域层不感知具体技术实现。
pub mod database;
pub mod observability;
pub mod repositories;
pub mod services;
pub mod stream;
