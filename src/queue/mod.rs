// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 周期触发器与保留清理
pub mod scheduler;
/// 验证任务队列
pub mod task_queue;
