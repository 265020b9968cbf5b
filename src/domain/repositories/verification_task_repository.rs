// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::verification_task::VerificationTask;
use crate::domain::repositories::job_repository::RepositoryError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// 验证任务仓库特质
///
/// 定义验证任务的入队、领取与状态流转接口。`acquire_next`
/// 必须保证同一任务不会被两个 worker 同时领取：领取时写入
/// 锁令牌与租约，租约过期的 Active 任务可被重新领取。
#[async_trait]
pub trait VerificationTaskRepository: Send + Sync {
    /// 批量入队，已有同职位未完结任务的跳过，返回实际入队数
    async fn enqueue_many(&self, tasks: &[VerificationTask]) -> Result<u64, RepositoryError>;
    /// 领取下一个到期的待处理任务并锁定
    async fn acquire_next(&self, worker_id: Uuid)
        -> Result<Option<VerificationTask>, RepositoryError>;
    /// 标记任务完成
    async fn mark_completed(&self, id: Uuid) -> Result<(), RepositoryError>;
    /// 记录失败并重新入队，按 `next_attempt_at` 推迟下次执行
    async fn reschedule(
        &self,
        id: Uuid,
        error: &str,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
    /// 标记任务进入死信状态
    async fn mark_dead_lettered(&self, id: Uuid, error: &str) -> Result<(), RepositoryError>;
    /// 根据ID查找任务
    async fn find_by_id(&self, id: Uuid) -> Result<Option<VerificationTask>, RepositoryError>;
    /// 释放租约过期的 Active 任务，返回释放数
    async fn release_expired_locks(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError>;
    /// 统计指定状态的任务数
    async fn count_by_status(
        &self,
        status: crate::domain::models::verification_task::VerificationStatus,
    ) -> Result<u64, RepositoryError>;
}
