// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::verification_task::VerificationTask;
use crate::domain::repositories::verification_task_repository::VerificationTaskRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// 队列错误类型
#[derive(Error, Debug)]
pub enum QueueError {
    /// 仓库错误
    #[error("Repository error: {0}")]
    Repository(#[from] crate::domain::repositories::job_repository::RepositoryError),
}

/// 验证任务队列特质
///
/// 对 worker 暴露的队列操作；持久化细节在仓库层
#[async_trait]
pub trait VerificationQueue: Send + Sync {
    /// 批量入队，返回实际入队数
    async fn enqueue_batch(&self, tasks: Vec<VerificationTask>) -> Result<u64, QueueError>;

    /// 出队并锁定下一个任务
    async fn dequeue(&self, worker_id: Uuid) -> Result<Option<VerificationTask>, QueueError>;

    /// 完成任务
    async fn complete(&self, task_id: Uuid) -> Result<(), QueueError>;

    /// 记录失败并推迟重试
    async fn retry_later(
        &self,
        task_id: Uuid,
        error: &str,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<(), QueueError>;

    /// 任务进入死信
    async fn dead_letter(&self, task_id: Uuid, error: &str) -> Result<(), QueueError>;

    /// 释放租约过期的任务，返回释放数
    async fn release_expired(&self, now: DateTime<Utc>) -> Result<u64, QueueError>;
}

/// 数据库验证任务队列实现
pub struct DatabaseVerificationQueue<R: VerificationTaskRepository> {
    /// 验证任务仓库
    repository: Arc<R>,
}

impl<R: VerificationTaskRepository> DatabaseVerificationQueue<R> {
    /// 创建新的数据库验证任务队列实例
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<R: VerificationTaskRepository> VerificationQueue for DatabaseVerificationQueue<R> {
    async fn enqueue_batch(&self, tasks: Vec<VerificationTask>) -> Result<u64, QueueError> {
        let enqueued = self.repository.enqueue_many(&tasks).await?;
        Ok(enqueued)
    }

    async fn dequeue(&self, worker_id: Uuid) -> Result<Option<VerificationTask>, QueueError> {
        let task = self.repository.acquire_next(worker_id).await?;
        Ok(task)
    }

    async fn complete(&self, task_id: Uuid) -> Result<(), QueueError> {
        self.repository.mark_completed(task_id).await?;
        Ok(())
    }

    async fn retry_later(
        &self,
        task_id: Uuid,
        error: &str,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<(), QueueError> {
        self.repository
            .reschedule(task_id, error, next_attempt_at)
            .await?;
        Ok(())
    }

    async fn dead_letter(&self, task_id: Uuid, error: &str) -> Result<(), QueueError> {
        self.repository.mark_dead_lettered(task_id, error).await?;
        Ok(())
    }

    async fn release_expired(&self, now: DateTime<Utc>) -> Result<u64, QueueError> {
        let released = self.repository.release_expired_locks(now).await?;
        Ok(released)
    }
}

#[async_trait]
impl<T: VerificationQueue + ?Sized> VerificationQueue for Arc<T> {
    async fn enqueue_batch(&self, tasks: Vec<VerificationTask>) -> Result<u64, QueueError> {
        (**self).enqueue_batch(tasks).await
    }

    async fn dequeue(&self, worker_id: Uuid) -> Result<Option<VerificationTask>, QueueError> {
        (**self).dequeue(worker_id).await
    }

    async fn complete(&self, task_id: Uuid) -> Result<(), QueueError> {
        (**self).complete(task_id).await
    }

    async fn retry_later(
        &self,
        task_id: Uuid,
        error: &str,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<(), QueueError> {
        (**self).retry_later(task_id, error, next_attempt_at).await
    }

    async fn dead_letter(&self, task_id: Uuid, error: &str) -> Result<(), QueueError> {
        (**self).dead_letter(task_id, error).await
    }

    async fn release_expired(&self, now: DateTime<Utc>) -> Result<u64, QueueError> {
        (**self).release_expired(now).await
    }
}
