// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 查询目录
pub mod catalog;
/// 抓取检查点
pub mod checkpoint;
/// 职位实体
pub mod job;
/// 站点原始职位数据
pub mod raw_posting;
/// 验证任务实体
pub mod verification_task;
