// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{create_test_db, new_job};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jobharvest::config::settings::VerificationSettings;
use jobharvest::domain::models::verification_task::{VerificationStatus, VerificationTask};
use jobharvest::domain::repositories::job_repository::JobRepository;
use jobharvest::domain::repositories::verification_task_repository::VerificationTaskRepository;
use jobharvest::engines::driver::ScrapeError;
use jobharvest::infrastructure::database::entities::verification_task as task_entity;
use jobharvest::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use jobharvest::infrastructure::repositories::verification_task_repo_impl::VerificationTaskRepositoryImpl;
use jobharvest::queue::task_queue::{DatabaseVerificationQueue, VerificationQueue};
use jobharvest::workers::verification_worker::{FetchError, LivenessFetcher, VerificationWorker};
use sea_orm::sea_query::Expr;
use sea_orm::{DatabaseConnection, EntityTrait};
use std::sync::Arc;
use uuid::Uuid;

/// 返回固定页面文本的抓取器
struct StaticFetcher(String);

#[async_trait]
impl LivenessFetcher for StaticFetcher {
    async fn fetch_page_text(&self, _url: &str) -> Result<String, FetchError> {
        Ok(self.0.clone())
    }
}

/// 每次都超时的抓取器
struct TimeoutFetcher;

#[async_trait]
impl LivenessFetcher for TimeoutFetcher {
    async fn fetch_page_text(&self, url: &str) -> Result<String, FetchError> {
        Err(FetchError::Scrape(ScrapeError::Navigation(format!(
            "timeout for {}",
            url
        ))))
    }
}

fn settings() -> VerificationSettings {
    VerificationSettings {
        worker_count: 1,
        max_retries: 3,
        enqueue_interval_hours: 24,
        expiring_window_days: 1,
        renewal_days: 7,
        lock_timeout_secs: 300,
        poll_interval_secs: 1,
    }
}

struct Fixture {
    db: Arc<DatabaseConnection>,
    job_repo: Arc<dyn JobRepository>,
    task_repo: Arc<VerificationTaskRepositoryImpl>,
    queue: Arc<dyn VerificationQueue>,
}

/// 建库、插入一条临期职位并入队其验证任务
async fn fixture() -> (Fixture, i32, Uuid) {
    let db = create_test_db().await;
    let job_repo: Arc<dyn JobRepository> = Arc::new(JobRepositoryImpl::new(db.clone()));
    let task_repo = Arc::new(VerificationTaskRepositoryImpl::new(
        db.clone(),
        chrono::Duration::seconds(300),
    ));
    let queue: Arc<dyn VerificationQueue> =
        Arc::new(DatabaseVerificationQueue::new(task_repo.clone()));

    let deadline = Utc::now() + Duration::days(1);
    job_repo
        .insert_many_skip_duplicates(&[new_job("https://example.com/job/1", deadline)])
        .await
        .unwrap();
    let job = job_repo
        .find_expiring(Utc::now() + Duration::days(2))
        .await
        .unwrap()
        .remove(0);

    let task = VerificationTask::new(job.id, job.source_url.clone(), 3);
    let task_id = task.id;
    assert_eq!(queue.enqueue_batch(vec![task]).await.unwrap(), 1);

    (
        Fixture {
            db,
            job_repo,
            task_repo,
            queue,
        },
        job.id,
        task_id,
    )
}

/// 把所有任务的 scheduled_at 拨回过去，让退避中的任务立即可领
async fn make_due_now(db: &DatabaseConnection) {
    task_entity::Entity::update_many()
        .col_expr(
            task_entity::Column::ScheduledAt,
            Expr::value(Utc::now() - Duration::minutes(5)),
        )
        .exec(db)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_live_job_gets_renewed_deadline() {
    let (fx, job_id, task_id) = fixture().await;
    let original = fx.job_repo.find_by_id(job_id).await.unwrap().unwrap();

    let worker = VerificationWorker::new(
        fx.queue.clone(),
        fx.job_repo.clone(),
        Arc::new(StaticFetcher("Backend Engineer - Apply now".into())),
        &settings(),
    );

    let task = fx.queue.dequeue(Uuid::new_v4()).await.unwrap().unwrap();
    worker.process(task).await.unwrap();

    let renewed = fx.job_repo.find_by_id(job_id).await.unwrap().unwrap();
    assert!(renewed.is_active);
    assert!(renewed.deadline > original.deadline);
    assert!(renewed.last_verified.is_some());

    let done = fx.task_repo.find_by_id(task_id).await.unwrap().unwrap();
    assert_eq!(done.status, VerificationStatus::Completed);
    assert!(done.completed_at.is_some());
}

#[tokio::test]
async fn test_closed_job_marked_inactive_with_deadline_untouched() {
    let (fx, job_id, task_id) = fixture().await;
    let original = fx.job_repo.find_by_id(job_id).await.unwrap().unwrap();

    let worker = VerificationWorker::new(
        fx.queue.clone(),
        fx.job_repo.clone(),
        Arc::new(StaticFetcher(
            "This job is no longer accepting applications".into(),
        )),
        &settings(),
    );

    let task = fx.queue.dequeue(Uuid::new_v4()).await.unwrap().unwrap();
    worker.process(task).await.unwrap();

    let closed = fx.job_repo.find_by_id(job_id).await.unwrap().unwrap();
    assert!(!closed.is_active);
    // The closed page was still observed
    assert!(closed.last_verified.is_some());
    // Closing never rewrites the deadline
    assert_eq!(
        (closed.deadline - original.deadline).num_milliseconds(),
        0
    );

    let done = fx.task_repo.find_by_id(task_id).await.unwrap().unwrap();
    assert_eq!(done.status, VerificationStatus::Completed);
}

#[tokio::test]
async fn test_transient_failures_exhaust_into_dead_letter() {
    let (fx, job_id, task_id) = fixture().await;
    let original = fx.job_repo.find_by_id(job_id).await.unwrap().unwrap();

    let worker = VerificationWorker::new(
        fx.queue.clone(),
        fx.job_repo.clone(),
        Arc::new(TimeoutFetcher),
        &settings(),
    );
    let worker_id = Uuid::new_v4();

    // Attempts one and two fail and reschedule with backoff
    for round in 1..=2 {
        let task = fx.queue.dequeue(worker_id).await.unwrap().unwrap();
        assert_eq!(task.attempt_count, round);
        worker.process(task).await.unwrap();

        let pending = fx.task_repo.find_by_id(task_id).await.unwrap().unwrap();
        assert_eq!(pending.status, VerificationStatus::Failed);
        assert!(pending.scheduled_at.unwrap() > Utc::now());

        // Backoff keeps the task invisible until its scheduled time
        assert!(fx.queue.dequeue(worker_id).await.unwrap().is_none());
        make_due_now(&fx.db).await;
    }

    // Third attempt exhausts the retry budget
    let task = fx.queue.dequeue(worker_id).await.unwrap().unwrap();
    assert_eq!(task.attempt_count, 3);
    worker.process(task).await.unwrap();

    let dead = fx.task_repo.find_by_id(task_id).await.unwrap().unwrap();
    assert_eq!(dead.status, VerificationStatus::DeadLettered);
    assert!(dead.last_error.is_some());

    // An inconclusive verification leaves the job exactly as it was
    let job = fx.job_repo.find_by_id(job_id).await.unwrap().unwrap();
    assert!(job.is_active);
    assert_eq!((job.deadline - original.deadline).num_milliseconds(), 0);
    assert!(job.last_verified.is_none());
}
