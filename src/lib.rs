// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 探测周期、批次发布用例和入站 DTO
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含目标、诊断记录、批次、告警等核心模型以及仓库和服务接口
pub mod domain;

/// 引擎模块
///
/// 实现 HTTP 探测引擎、内容分析、技术指纹和 TLS 检查
pub mod engines;

/// 基础设施模块
///
/// 提供外部服务集成，如目标存储、结果流和告警通道
pub mod infrastructure;

/// 表示层模块
///
/// 处理HTTP请求和响应，包括路由和处理器
pub mod presentation;

/// 队列模块
///
/// 实现周期调度功能
pub mod queue;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;

/// 工作器模块
///
/// 实现有界并发的探测工作池
pub mod workers;
