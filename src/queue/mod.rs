// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 提供周期调度功能：按固定节拍解析目标并触发探测周期
pub mod scheduler;
