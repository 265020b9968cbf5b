// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::Job;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DbErr;
use thiserror::Error;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
}

/// 待插入的职位（无ID，ID由数据库分配）
#[derive(Debug, Clone)]
pub struct NewJob {
    pub title: String,
    pub category: String,
    pub source_url: String,
    pub company_name: String,
    pub company_url: String,
    pub location: String,
    pub job_type: String,
    pub description: String,
    pub salary_range: Option<String>,
    pub tags: Vec<String>,
    pub rating: f64,
    pub experience: String,
    pub min_experience: Option<i32>,
    pub max_experience: Option<i32>,
    pub posted_at_raw: String,
    pub posted_at: Option<DateTime<Utc>>,
    pub deadline: DateTime<Utc>,
    pub company_logo: String,
    pub via: String,
    pub employer_id: String,
}

/// 保留清理统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PurgeReport {
    /// 删除的职位数
    pub jobs_deleted: u64,
    /// 级联删除的收藏记录数
    pub saved_deleted: u64,
    /// 级联删除的投递记录数
    pub applied_deleted: u64,
}

/// 职位仓库特质
///
/// 定义职位数据访问接口
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// 批量插入职位，source_url 冲突的行静默跳过，返回实际插入数
    async fn insert_many_skip_duplicates(&self, jobs: &[NewJob]) -> Result<u64, RepositoryError>;
    /// 根据ID查找职位
    async fn find_by_id(&self, id: i32) -> Result<Option<Job>, RepositoryError>;
    /// 查找活跃且 deadline 在指定时间之前的职位
    async fn find_expiring(&self, before: DateTime<Utc>) -> Result<Vec<Job>, RepositoryError>;
    /// 验证通过：续期 deadline 并记录验证时间
    async fn renew_deadline(
        &self,
        id: i32,
        new_deadline: DateTime<Utc>,
        verified_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
    /// 职位已关闭：标记非活跃并记录验证时间，deadline 不变
    async fn mark_inactive(&self, id: i32) -> Result<(), RepositoryError>;
    /// 删除验证时间早于指定时间的非活跃职位及其依赖记录（收藏、投递）
    async fn purge_inactive(&self, inactive_before: DateTime<Utc>)
        -> Result<PurgeReport, RepositoryError>;
    /// 统计活跃职位数
    async fn count_active(&self) -> Result<u64, RepositoryError>;
}
