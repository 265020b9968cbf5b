// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 领域错误类型
#[derive(Error, Debug)]
pub enum DomainError {
    /// 验证错误，输入数据不符合领域规则
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// 职位实体
///
/// 摄入服务落库后的规范化职位。`source_url` 全表唯一，
/// `deadline` 决定何时进入验证队列，验证通过则续期、
/// 失败则标记为非活跃等待保留策略清理。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// 职位ID
    pub id: i32,
    /// 职位标题
    pub title: String,
    /// 所属分类（来自查询目录）
    pub category: String,
    /// 职位详情页URL，唯一去重键
    pub source_url: String,
    /// 公司名称
    pub company_name: String,
    /// 公司主页URL
    pub company_url: String,
    /// 工作地点
    pub location: String,
    /// 工作类型
    pub job_type: String,
    /// 职位描述
    pub description: String,
    /// 薪资范围
    pub salary_range: Option<String>,
    /// 技能标签
    pub tags: Vec<String>,
    /// 公司评分
    pub rating: f64,
    /// 经验要求原文
    pub experience: String,
    /// 最小经验年限
    pub min_experience: Option<i32>,
    /// 最大经验年限
    pub max_experience: Option<i32>,
    /// 发布时间原文
    pub posted_at_raw: String,
    /// 解析后的发布时间
    pub posted_at: Option<DateTime<Utc>>,
    /// 是否活跃
    pub is_active: bool,
    /// 有效期截止时间
    pub deadline: DateTime<Utc>,
    /// 最近一次验证通过时间
    pub last_verified: Option<DateTime<Utc>>,
    /// 公司 Logo URL
    pub company_logo: String,
    /// 来源站点主机名
    pub via: String,
    /// 站点侧雇主标识
    pub employer_id: String,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

