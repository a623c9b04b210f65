// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 数据库实体模块
///
/// 目标存储中的只读表，使用SeaORM进行对象关系映射
pub mod endpoint;
pub mod resource;
pub mod user_selected_endpoint;
