// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 编排领域服务与探测引擎，完成一次探测周期的全部流程
pub mod dto;
pub mod use_cases;
