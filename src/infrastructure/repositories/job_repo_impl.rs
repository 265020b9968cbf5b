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

use crate::domain::models::job::Job;
use crate::domain::repositories::job_repository::{
    JobRepository, NewJob, PurgeReport, RepositoryError,
};
use crate::infrastructure::database::entities::{applied_job, job as job_entity, saved_job};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::info;

/// 职位仓库实现
///
/// 基于SeaORM实现的职位数据访问层
#[derive(Clone)]
pub struct JobRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl JobRepositoryImpl {
    /// 创建新的职位仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<job_entity::Model> for Job {
    fn from(model: job_entity::Model) -> Self {
        let tags = serde_json::from_value(model.tags).unwrap_or_default();
        Self {
            id: model.id,
            title: model.title,
            category: model.category,
            source_url: model.source_url,
            company_name: model.company_name,
            company_url: model.company_url,
            location: model.location,
            job_type: model.job_type,
            description: model.description,
            salary_range: model.salary_range,
            tags,
            rating: model.rating,
            experience: model.experience,
            min_experience: model.min_experience,
            max_experience: model.max_experience,
            posted_at_raw: model.posted_at_raw,
            posted_at: model.posted_at,
            is_active: model.is_active,
            deadline: model.deadline,
            last_verified: model.last_verified,
            company_logo: model.company_logo,
            via: model.via,
            employer_id: model.employer_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

fn new_job_to_active(job: &NewJob, now: DateTime<Utc>) -> job_entity::ActiveModel {
    job_entity::ActiveModel {
        title: Set(job.title.clone()),
        category: Set(job.category.clone()),
        source_url: Set(job.source_url.clone()),
        company_name: Set(job.company_name.clone()),
        company_url: Set(job.company_url.clone()),
        location: Set(job.location.clone()),
        job_type: Set(job.job_type.clone()),
        description: Set(job.description.clone()),
        salary_range: Set(job.salary_range.clone()),
        tags: Set(serde_json::json!(job.tags)),
        rating: Set(job.rating),
        experience: Set(job.experience.clone()),
        min_experience: Set(job.min_experience),
        max_experience: Set(job.max_experience),
        posted_at_raw: Set(job.posted_at_raw.clone()),
        posted_at: Set(job.posted_at),
        is_active: Set(true),
        deadline: Set(job.deadline),
        last_verified: Set(None),
        company_logo: Set(job.company_logo.clone()),
        via: Set(job.via.clone()),
        employer_id: Set(job.employer_id.clone()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
}

#[async_trait]
impl JobRepository for JobRepositoryImpl {
    async fn insert_many_skip_duplicates(&self, jobs: &[NewJob]) -> Result<u64, RepositoryError> {
        if jobs.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let models: Vec<job_entity::ActiveModel> =
            jobs.iter().map(|j| new_job_to_active(j, now)).collect();

        let inserted = job_entity::Entity::insert_many(models)
            .on_conflict(
                OnConflict::column(job_entity::Column::SourceUrl)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await?;

        Ok(inserted)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Job>, RepositoryError> {
        let model = job_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn find_expiring(&self, before: DateTime<Utc>) -> Result<Vec<Job>, RepositoryError> {
        let models = job_entity::Entity::find()
            .filter(job_entity::Column::IsActive.eq(true))
            .filter(job_entity::Column::Deadline.lte(before))
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn renew_deadline(
        &self,
        id: i32,
        new_deadline: DateTime<Utc>,
        verified_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let model = job_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let mut active: job_entity::ActiveModel = model.into();
        active.deadline = Set(new_deadline);
        active.last_verified = Set(Some(verified_at));
        active.is_active = Set(true);
        active.updated_at = Set(verified_at);
        active.update(self.db.as_ref()).await?;
        Ok(())
    }

    async fn mark_inactive(&self, id: i32) -> Result<(), RepositoryError> {
        let model = job_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let now = Utc::now();
        let mut active: job_entity::ActiveModel = model.into();
        active.is_active = Set(false);
        // The page was observed even though the listing is closed;
        // the retention sweep keys on this timestamp
        active.last_verified = Set(Some(now));
        active.updated_at = Set(now);
        active.update(self.db.as_ref()).await?;
        Ok(())
    }

    async fn purge_inactive(
        &self,
        inactive_before: DateTime<Utc>,
    ) -> Result<PurgeReport, RepositoryError> {
        let txn = self.db.begin().await?;

        let ids: Vec<i32> = job_entity::Entity::find()
            .filter(job_entity::Column::IsActive.eq(false))
            .filter(job_entity::Column::LastVerified.lte(inactive_before))
            .select_only()
            .column(job_entity::Column::Id)
            .into_tuple()
            .all(&txn)
            .await?;

        if ids.is_empty() {
            txn.commit().await?;
            return Ok(PurgeReport::default());
        }

        // Dependents first so the job delete never orphans rows
        let saved = saved_job::Entity::delete_many()
            .filter(saved_job::Column::JobId.is_in(ids.clone()))
            .exec(&txn)
            .await?;
        let applied = applied_job::Entity::delete_many()
            .filter(applied_job::Column::JobId.is_in(ids.clone()))
            .exec(&txn)
            .await?;
        let jobs = job_entity::Entity::delete_many()
            .filter(job_entity::Column::Id.is_in(ids))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        let report = PurgeReport {
            jobs_deleted: jobs.rows_affected,
            saved_deleted: saved.rows_affected,
            applied_deleted: applied.rows_affected,
        };
        info!(
            jobs = report.jobs_deleted,
            saved = report.saved_deleted,
            applied = report.applied_deleted,
            "Purged expired inactive jobs"
        );
        Ok(report)
    }

    async fn count_active(&self) -> Result<u64, RepositoryError> {
        let count = job_entity::Entity::find()
            .filter(job_entity::Column::IsActive.eq(true))
            .count(self.db.as_ref())
            .await?;
        Ok(count)
    }
}
