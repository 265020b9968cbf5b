// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::create_test_db;
use chrono::{Duration, Utc};
use jobharvest::domain::models::raw_posting::RawJobPosting;
use jobharvest::domain::repositories::job_repository::JobRepository;
use jobharvest::domain::services::ingestion_service::IngestionService;
use jobharvest::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use std::sync::Arc;

fn posting(source_url: &str) -> RawJobPosting {
    let mut posting = RawJobPosting::new("Backend Engineer", source_url);
    posting.company_name = Some("Acme Corp".into());
    posting.location = Some("Bengaluru".into());
    posting.experience = Some("2-5 Yrs".into());
    posting.posted_at_raw = Some("3 days ago".into());
    posting.tags = vec!["rust".into()];
    posting
}

/// 同一 source_url 不论出现在同批还是跨批，都只落一行
#[tokio::test]
async fn test_duplicate_source_url_inserted_once() {
    let db = create_test_db().await;
    let repo: Arc<dyn JobRepository> = Arc::new(JobRepositoryImpl::new(db));
    let service = IngestionService::new(repo.clone(), 7, 7);

    let url = "https://www.naukri.com/job-listings-backend-engineer-1";
    let report = service
        .ingest("Engineering", vec![posting(url), posting(url)], "naukri")
        .await;
    assert_eq!(report.inserted, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failed, 0);

    // Same posting scraped again on a later run
    let report = service
        .ingest("Engineering", vec![posting(url)], "naukri")
        .await;
    assert_eq!(report.inserted, 0);
    assert_eq!(report.skipped, 1);

    assert_eq!(repo.count_active().await.unwrap(), 1);
}

/// 缺失字段按命名默认值落库，新职位拿到初始 deadline
#[tokio::test]
async fn test_missing_fields_get_named_defaults() {
    let db = create_test_db().await;
    let repo: Arc<dyn JobRepository> = Arc::new(JobRepositoryImpl::new(db));
    let service = IngestionService::new(repo.clone(), 7, 7);

    let bare = RawJobPosting::new("Data Analyst", "https://example.com/job/77");
    let report = service.ingest("Data", vec![bare], "naukri").await;
    assert_eq!(report.inserted, 1);

    let jobs = repo
        .find_expiring(Utc::now() + Duration::days(30))
        .await
        .unwrap();
    assert_eq!(jobs.len(), 1);

    let job = &jobs[0];
    assert_eq!(job.location, "null");
    assert_eq!(job.job_type, "Not Mentioned");
    assert_eq!(job.rating, 0.0);
    assert!(job.is_active);

    let days_out = (job.deadline - Utc::now()).num_days();
    assert!((6..=7).contains(&days_out));
}

/// 不可用卡片（缺标题或链接）被跳过，不污染批次
#[tokio::test]
async fn test_unusable_cards_skipped() {
    let db = create_test_db().await;
    let repo: Arc<dyn JobRepository> = Arc::new(JobRepositoryImpl::new(db));
    let service = IngestionService::new(repo.clone(), 7, 7);

    let no_title = RawJobPosting::new("  ", "https://example.com/job/1");
    let no_url = RawJobPosting::new("Backend Engineer", "");
    let good = posting("https://example.com/job/2");

    let report = service
        .ingest("Engineering", vec![no_title, no_url, good], "naukri")
        .await;
    assert_eq!(report.inserted, 1);
    assert_eq!(report.skipped, 2);
    assert_eq!(repo.count_active().await.unwrap(), 1);
}
