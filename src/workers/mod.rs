// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 提供有界并发的探测工作池：固定数量的工作协程消费目标队列，
/// 并按目标顺序汇集结果
pub mod probe_pool;

pub use probe_pool::ProbePool;
