// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 经验年限解析
pub mod experience;
/// 发布时间解析
pub mod posted_at;
/// 重试策略
pub mod retry_policy;
/// 查询标题转 URL slug
pub mod slug;
/// 日志遥测初始化
pub mod telemetry;
