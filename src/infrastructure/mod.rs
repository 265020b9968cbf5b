// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 该模块包含系统的技术实现细节，提供对具体技术的抽象和封装。
/// 基础设施层负责与外部系统的交互，包括数据库、代理、存储等。
///
/// 包含的子模块：
/// - 检查点存储（checkpoint_store）：抓取检查点的持久化
/// - 数据库（database）：提供数据库连接和实体映射
/// - 可观测性（observability）：Prometheus 指标与资源监控
/// - 代理（proxy）：带认证的本地代理隧道
/// - 仓库实现（repositories）：提供领域仓库接口的具体实现
/// - 存储（storage）：提供文件和对象存储功能
///
/// 基础设施层遵循依赖倒置原则，依赖于领域层的抽象接口，
/// 确保领域层保持纯粹的业务逻辑，不受技术实现的影响。
pub mod checkpoint_store;
pub mod database;
pub mod observability;
pub mod proxy;
pub mod repositories;
pub mod storage;
