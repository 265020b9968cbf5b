// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心业务实体、服务和仓库接口
pub mod domain;

/// 引擎模块
///
/// 浏览器会话、列表页抓取驱动与分页探测
pub mod engines;

/// 基础设施模块
///
/// 提供外部服务集成，如数据库、存储、代理等
pub mod infrastructure;

/// 队列模块
///
/// 实现验证任务队列和周期调度功能
pub mod queue;

/// 站点模块
///
/// 各职位来源站点的 URL 形态与卡片解析规则
pub mod sites;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;

/// 工作器模块
///
/// 实现后台任务处理和工作器管理
pub mod workers;
