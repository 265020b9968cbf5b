// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::verification_task::{VerificationStatus, VerificationTask};
use crate::domain::repositories::job_repository::RepositoryError;
use crate::domain::repositories::verification_task_repository::VerificationTaskRepository;
use crate::infrastructure::database::entities::verification_task as task_entity;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    sea_query::{Expr, LockBehavior, LockType},
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbBackend,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

/// 验证任务仓库实现
///
/// 基于SeaORM实现的验证任务数据访问层。领取走事务加行锁，
/// Postgres 下附带 SKIP LOCKED 保证多 worker 互不阻塞。
#[derive(Clone)]
pub struct VerificationTaskRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
    /// 任务锁租约时长
    lock_timeout: Duration,
}

impl VerificationTaskRepositoryImpl {
    /// 创建新的验证任务仓库实例
    pub fn new(db: Arc<DatabaseConnection>, lock_timeout: Duration) -> Self {
        Self { db, lock_timeout }
    }
}

impl From<task_entity::Model> for VerificationTask {
    fn from(model: task_entity::Model) -> Self {
        Self {
            id: model.id,
            job_id: model.job_id,
            job_url: model.job_url,
            status: model.status.parse().unwrap_or_default(),
            attempt_count: model.attempt_count,
            max_retries: model.max_retries,
            scheduled_at: model.scheduled_at,
            enqueued_at: model.enqueued_at,
            started_at: model.started_at,
            completed_at: model.completed_at,
            last_error: model.last_error,
            lock_token: model.lock_token,
            lock_expires_at: model.lock_expires_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<&VerificationTask> for task_entity::ActiveModel {
    fn from(task: &VerificationTask) -> Self {
        Self {
            id: Set(task.id),
            job_id: Set(task.job_id),
            job_url: Set(task.job_url.clone()),
            status: Set(task.status.to_string()),
            attempt_count: Set(task.attempt_count),
            max_retries: Set(task.max_retries),
            scheduled_at: Set(task.scheduled_at),
            enqueued_at: Set(task.enqueued_at),
            started_at: Set(task.started_at),
            completed_at: Set(task.completed_at),
            last_error: Set(task.last_error.clone()),
            lock_token: Set(task.lock_token),
            lock_expires_at: Set(task.lock_expires_at),
            created_at: Set(task.created_at),
            updated_at: Set(task.updated_at),
        }
    }
}

#[async_trait]
impl VerificationTaskRepository for VerificationTaskRepositoryImpl {
    async fn enqueue_many(&self, tasks: &[VerificationTask]) -> Result<u64, RepositoryError> {
        if tasks.is_empty() {
            return Ok(0);
        }

        // One pending task per job at a time
        let job_ids: Vec<i32> = tasks.iter().map(|t| t.job_id).collect();
        let pending: Vec<i32> = task_entity::Entity::find()
            .filter(task_entity::Column::JobId.is_in(job_ids))
            .filter(task_entity::Column::Status.is_in([
                VerificationStatus::Queued.to_string(),
                VerificationStatus::Active.to_string(),
                VerificationStatus::Failed.to_string(),
            ]))
            .select_only()
            .column(task_entity::Column::JobId)
            .into_tuple()
            .all(self.db.as_ref())
            .await?;

        let models: Vec<task_entity::ActiveModel> = tasks
            .iter()
            .filter(|t| !pending.contains(&t.job_id))
            .map(Into::into)
            .collect();
        if models.is_empty() {
            return Ok(0);
        }

        let inserted = task_entity::Entity::insert_many(models)
            .exec_without_returning(self.db.as_ref())
            .await?;
        Ok(inserted)
    }

    async fn acquire_next(
        &self,
        worker_id: Uuid,
    ) -> Result<Option<VerificationTask>, RepositoryError> {
        let txn = self.db.begin().await?;

        let mut query = task_entity::Entity::find()
            .filter(task_entity::Column::Status.is_in([
                VerificationStatus::Queued.to_string(),
                VerificationStatus::Failed.to_string(),
            ]))
            .filter(
                Condition::any()
                    .add(task_entity::Column::ScheduledAt.is_null())
                    .add(task_entity::Column::ScheduledAt.lte(Utc::now())),
            )
            .order_by_asc(task_entity::Column::EnqueuedAt);

        // SQLite has no row locks; single-writer semantics cover it there
        if self.db.get_database_backend() == DbBackend::Postgres {
            query = query.lock_with_behavior(LockType::Update, LockBehavior::SkipLocked);
        }

        let task = query.one(&txn).await?;

        if let Some(task) = task {
            let now = Utc::now();
            let mut active: task_entity::ActiveModel = task.into();
            active.status = Set(VerificationStatus::Active.to_string());
            active.lock_token = Set(Some(worker_id));
            active.lock_expires_at = Set(Some(now + self.lock_timeout));
            active.started_at = Set(Some(now));
            let current_attempt = *active.attempt_count.as_ref();
            active.attempt_count = Set(current_attempt + 1);
            active.updated_at = Set(now);

            let updated = active.update(&txn).await?;
            txn.commit().await?;
            return Ok(Some(updated.into()));
        }

        txn.commit().await?;
        Ok(None)
    }

    async fn mark_completed(&self, id: Uuid) -> Result<(), RepositoryError> {
        let model = task_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let now = Utc::now();
        let mut active: task_entity::ActiveModel = model.into();
        active.status = Set(VerificationStatus::Completed.to_string());
        active.completed_at = Set(Some(now));
        active.lock_token = Set(None);
        active.lock_expires_at = Set(None);
        active.updated_at = Set(now);
        active.update(self.db.as_ref()).await?;
        Ok(())
    }

    async fn reschedule(
        &self,
        id: Uuid,
        error: &str,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let model = task_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let mut active: task_entity::ActiveModel = model.into();
        active.status = Set(VerificationStatus::Failed.to_string());
        active.scheduled_at = Set(Some(next_attempt_at));
        active.last_error = Set(Some(error.to_string()));
        active.lock_token = Set(None);
        active.lock_expires_at = Set(None);
        active.updated_at = Set(Utc::now());
        active.update(self.db.as_ref()).await?;
        Ok(())
    }

    async fn mark_dead_lettered(&self, id: Uuid, error: &str) -> Result<(), RepositoryError> {
        let model = task_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let now = Utc::now();
        let mut active: task_entity::ActiveModel = model.into();
        active.status = Set(VerificationStatus::DeadLettered.to_string());
        active.completed_at = Set(Some(now));
        active.last_error = Set(Some(error.to_string()));
        active.lock_token = Set(None);
        active.lock_expires_at = Set(None);
        active.updated_at = Set(now);
        active.update(self.db.as_ref()).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<VerificationTask>, RepositoryError> {
        let model = task_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn release_expired_locks(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = task_entity::Entity::update_many()
            .col_expr(
                task_entity::Column::Status,
                Expr::value(VerificationStatus::Queued.to_string()),
            )
            .col_expr(task_entity::Column::LockToken, Expr::value(Option::<Uuid>::None))
            .col_expr(
                task_entity::Column::LockExpiresAt,
                Expr::value(Option::<DateTime<Utc>>::None),
            )
            .col_expr(task_entity::Column::UpdatedAt, Expr::value(now))
            .filter(task_entity::Column::Status.eq(VerificationStatus::Active.to_string()))
            .filter(task_entity::Column::LockExpiresAt.lt(now))
            .exec(self.db.as_ref())
            .await?;
        Ok(result.rows_affected)
    }

    async fn count_by_status(&self, status: VerificationStatus) -> Result<u64, RepositoryError> {
        let count = task_entity::Entity::find()
            .filter(task_entity::Column::Status.eq(status.to_string()))
            .count(self.db.as_ref())
            .await?;
        Ok(count)
    }
}
