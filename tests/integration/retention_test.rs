// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{create_test_db, new_job};
use chrono::{DateTime, Duration, Utc};
use jobharvest::domain::repositories::job_repository::JobRepository;
use jobharvest::infrastructure::database::entities::{applied_job, job as job_entity, saved_job};
use jobharvest::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set,
};
use std::sync::Arc;

/// 标记职位非活跃并把验证时间拨到指定时刻；
/// updated_at 保持新鲜，清理只看 last_verified
async fn mark_inactive_verified_at(
    db: &DatabaseConnection,
    job_id: i32,
    verified_at: DateTime<Utc>,
) {
    job_entity::Entity::update_many()
        .col_expr(job_entity::Column::IsActive, Expr::value(false))
        .col_expr(job_entity::Column::LastVerified, Expr::value(Some(verified_at)))
        .filter(job_entity::Column::Id.eq(job_id))
        .exec(db)
        .await
        .unwrap();
}

async fn add_dependents(db: &DatabaseConnection, job_id: i32) {
    saved_job::ActiveModel {
        job_id: Set(job_id),
        user_id: Set(1),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();
    applied_job::ActiveModel {
        job_id: Set(job_id),
        user_id: Set(1),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();
}

/// 过期的非活跃职位连同收藏、投递记录一并删除；
/// 仍在保留窗口内的非活跃职位保留
#[tokio::test]
async fn test_purge_deletes_old_inactive_jobs_with_dependents() {
    let db = create_test_db().await;
    let repo: Arc<dyn JobRepository> = Arc::new(JobRepositoryImpl::new(db.clone()));

    for url in [
        "https://example.com/job/old",
        "https://example.com/job/recent",
        "https://example.com/job/live",
    ] {
        repo.insert_many_skip_duplicates(&[new_job(url, Utc::now() + Duration::days(7))])
            .await
            .unwrap();
    }
    let find_id = |url: &'static str| {
        let db = db.clone();
        async move {
            job_entity::Entity::find()
                .filter(job_entity::Column::SourceUrl.eq(url))
                .one(db.as_ref())
                .await
                .unwrap()
                .unwrap()
                .id
        }
    };
    let old_id = find_id("https://example.com/job/old").await;
    let recent_id = find_id("https://example.com/job/recent").await;
    let live_id = find_id("https://example.com/job/live").await;

    // Last verified 20 days ago: past the retention window
    mark_inactive_verified_at(&db, old_id, Utc::now() - Duration::days(20)).await;
    // Last verified 5 days ago: still retained
    mark_inactive_verified_at(&db, recent_id, Utc::now() - Duration::days(5)).await;
    add_dependents(&db, old_id).await;
    add_dependents(&db, live_id).await;

    let report = repo
        .purge_inactive(Utc::now() - Duration::days(14))
        .await
        .unwrap();
    assert_eq!(report.jobs_deleted, 1);
    assert_eq!(report.saved_deleted, 1);
    assert_eq!(report.applied_deleted, 1);

    assert!(repo.find_by_id(old_id).await.unwrap().is_none());
    assert!(repo.find_by_id(recent_id).await.unwrap().is_some());
    assert!(repo.find_by_id(live_id).await.unwrap().is_some());

    // Dependents of surviving jobs are untouched
    assert_eq!(
        saved_job::Entity::find().count(db.as_ref()).await.unwrap(),
        1
    );
    assert_eq!(
        applied_job::Entity::find().count(db.as_ref()).await.unwrap(),
        1
    );
}

/// 没有到期职位时清理是空操作
#[tokio::test]
async fn test_purge_with_nothing_to_delete() {
    let db = create_test_db().await;
    let repo: Arc<dyn JobRepository> = Arc::new(JobRepositoryImpl::new(db.clone()));

    repo.insert_many_skip_duplicates(&[new_job(
        "https://example.com/job/1",
        Utc::now() + Duration::days(7),
    )])
    .await
    .unwrap();

    let report = repo
        .purge_inactive(Utc::now() - Duration::days(14))
        .await
        .unwrap();
    assert_eq!(report.jobs_deleted, 0);
    assert_eq!(report.saved_deleted, 0);
    assert_eq!(report.applied_deleted, 0);
    assert_eq!(repo.count_active().await.unwrap(), 1);
}

/// 非活跃职位必须带有验证时间，保留清理才有锚点
#[tokio::test]
async fn test_mark_inactive_records_verification_time() {
    let db = create_test_db().await;
    let repo: Arc<dyn JobRepository> = Arc::new(JobRepositoryImpl::new(db.clone()));

    repo.insert_many_skip_duplicates(&[new_job(
        "https://example.com/job/closed",
        Utc::now() + Duration::days(7),
    )])
    .await
    .unwrap();
    let id = job_entity::Entity::find()
        .one(db.as_ref())
        .await
        .unwrap()
        .unwrap()
        .id;

    repo.mark_inactive(id).await.unwrap();

    let job = repo.find_by_id(id).await.unwrap().unwrap();
    assert!(!job.is_active);
    let verified = job.last_verified.expect("inactive job must carry last_verified");
    assert!(verified <= Utc::now());
}
