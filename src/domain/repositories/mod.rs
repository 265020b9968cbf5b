// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层的仓库接口，遵循依赖倒置原则。
/// 仓库接口定义了数据持久化的抽象契约，具体实现由基础设施层提供。
///
/// 包含的仓库接口：
/// - 职位仓库（job_repository）：管理职位的批量摄入、临期查询与保留清理
/// - 验证任务仓库（verification_task_repository）：管理验证任务的调度和执行
/// - 存储仓库（storage_repository）：管理 HTML 片段、截图与检查点的存储
///
/// 这些接口确保了领域层不依赖于具体的数据存储技术，
/// 提高了系统的可测试性和可维护性.
pub mod job_repository;
pub mod storage_repository;
pub mod verification_task_repository;
