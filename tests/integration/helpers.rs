// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use jobharvest::domain::repositories::job_repository::NewJob;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;

/// 创建内存数据库并应用全部迁移
pub async fn create_test_db() -> Arc<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("sqlite in-memory connection should open");
    Migrator::up(&db, None)
        .await
        .expect("migrations should apply");
    Arc::new(db)
}

/// 构造一条可插入的职位记录
pub fn new_job(source_url: &str, deadline: DateTime<Utc>) -> NewJob {
    NewJob {
        title: "Backend Engineer".into(),
        category: "Engineering".into(),
        source_url: source_url.into(),
        company_name: "Acme Corp".into(),
        company_url: "null".into(),
        location: "Remote".into(),
        job_type: "Not Mentioned".into(),
        description: "Build and run backend services".into(),
        salary_range: None,
        tags: vec!["rust".into(), "postgres".into()],
        rating: 4.1,
        experience: "2-5 Yrs".into(),
        min_experience: Some(2),
        max_experience: Some(5),
        posted_at_raw: "3 days ago".into(),
        posted_at: Some(Utc::now()),
        deadline,
        company_logo: String::new(),
        via: "naukri.com".into(),
        employer_id: "naukri".into(),
    }
}
