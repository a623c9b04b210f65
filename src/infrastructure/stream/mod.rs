// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 下游流模块
///
/// 基于Redis Streams的批次发布实现
pub mod redis_stream;
