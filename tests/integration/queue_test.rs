// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{create_test_db, new_job};
use chrono::{Duration, Utc};
use jobharvest::domain::models::verification_task::{VerificationStatus, VerificationTask};
use jobharvest::domain::repositories::job_repository::JobRepository;
use jobharvest::domain::repositories::verification_task_repository::VerificationTaskRepository;
use jobharvest::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use jobharvest::infrastructure::repositories::verification_task_repo_impl::VerificationTaskRepositoryImpl;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;

async fn seed_job(db: &Arc<DatabaseConnection>) -> (Arc<dyn JobRepository>, i32) {
    let job_repo: Arc<dyn JobRepository> = Arc::new(JobRepositoryImpl::new(db.clone()));
    job_repo
        .insert_many_skip_duplicates(&[new_job(
            "https://example.com/job/1",
            Utc::now() + Duration::days(1),
        )])
        .await
        .unwrap();
    let job_id = job_repo
        .find_expiring(Utc::now() + Duration::days(2))
        .await
        .unwrap()[0]
        .id;
    (job_repo, job_id)
}

/// 同一职位已有未完结任务时，重复入队被跳过
#[tokio::test]
async fn test_enqueue_skips_jobs_with_pending_tasks() {
    let db = create_test_db().await;
    let (_, job_id) = seed_job(&db).await;
    let repo = VerificationTaskRepositoryImpl::new(db, chrono::Duration::seconds(300));

    let first = VerificationTask::new(job_id, "https://example.com/job/1".into(), 3);
    assert_eq!(repo.enqueue_many(&[first]).await.unwrap(), 1);

    // The daily scan will offer the same job again while its task is pending
    let second = VerificationTask::new(job_id, "https://example.com/job/1".into(), 3);
    assert_eq!(repo.enqueue_many(&[second]).await.unwrap(), 0);

    // Once the task concludes, the job becomes eligible again
    let acquired = repo.acquire_next(Uuid::new_v4()).await.unwrap().unwrap();
    repo.mark_completed(acquired.id).await.unwrap();

    let third = VerificationTask::new(job_id, "https://example.com/job/1".into(), 3);
    assert_eq!(repo.enqueue_many(&[third]).await.unwrap(), 1);
}

/// 领取后的任务对其他 worker 不可见
#[tokio::test]
async fn test_acquired_task_is_locked() {
    let db = create_test_db().await;
    let (_, job_id) = seed_job(&db).await;
    let repo = VerificationTaskRepositoryImpl::new(db, chrono::Duration::seconds(300));

    let task = VerificationTask::new(job_id, "https://example.com/job/1".into(), 3);
    repo.enqueue_many(&[task]).await.unwrap();

    let acquired = repo.acquire_next(Uuid::new_v4()).await.unwrap().unwrap();
    assert_eq!(acquired.status, VerificationStatus::Active);
    assert!(acquired.lock_token.is_some());
    assert!(acquired.lock_expires_at.unwrap() > Utc::now());

    assert!(repo.acquire_next(Uuid::new_v4()).await.unwrap().is_none());
}

/// 租约过期的任务被看门狗释放后可重新领取
#[tokio::test]
async fn test_expired_lock_released_and_reacquired() {
    let db = create_test_db().await;
    let (_, job_id) = seed_job(&db).await;
    // Zero-length lease: the lock expires the moment it is taken
    let repo = VerificationTaskRepositoryImpl::new(db, chrono::Duration::seconds(0));

    let task = VerificationTask::new(job_id, "https://example.com/job/1".into(), 3);
    repo.enqueue_many(&[task]).await.unwrap();

    let acquired = repo.acquire_next(Uuid::new_v4()).await.unwrap().unwrap();
    assert_eq!(acquired.attempt_count, 1);

    let released = repo
        .release_expired_locks(Utc::now() + Duration::seconds(1))
        .await
        .unwrap();
    assert_eq!(released, 1);

    let reacquired = repo.acquire_next(Uuid::new_v4()).await.unwrap().unwrap();
    assert_eq!(reacquired.id, acquired.id);
    assert_eq!(reacquired.attempt_count, 2);
}

/// 状态计数覆盖全部入队任务
#[tokio::test]
async fn test_count_by_status() {
    let db = create_test_db().await;
    let (_, job_id) = seed_job(&db).await;
    let repo = VerificationTaskRepositoryImpl::new(db, chrono::Duration::seconds(300));

    let task = VerificationTask::new(job_id, "https://example.com/job/1".into(), 3);
    repo.enqueue_many(&[task]).await.unwrap();

    assert_eq!(
        repo.count_by_status(VerificationStatus::Queued).await.unwrap(),
        1
    );
    assert_eq!(
        repo.count_by_status(VerificationStatus::Completed)
            .await
            .unwrap(),
        0
    );
}
