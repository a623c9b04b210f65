// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：探测目标、诊断记录、批次与告警
/// - 仓库接口（repositories）：目标存储的只读抽象
/// - 服务（services）：批次聚合、发布与通知的抽象接口
///
/// 领域层不依赖于任何外部实现。
pub mod models;
pub mod repositories;
pub mod services;
