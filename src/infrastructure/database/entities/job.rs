// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "jobs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub category: String,
    #[sea_orm(unique)]
    pub source_url: String,
    pub company_name: String,
    pub company_url: String,
    pub location: String,
    pub job_type: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub salary_range: Option<String>,
    pub tags: Json,
    pub rating: f64,
    pub experience: String,
    pub min_experience: Option<i32>,
    pub max_experience: Option<i32>,
    pub posted_at_raw: String,
    pub posted_at: Option<ChronoDateTimeUtc>,
    pub is_active: bool,
    pub deadline: ChronoDateTimeUtc,
    pub last_verified: Option<ChronoDateTimeUtc>,
    pub company_logo: String,
    pub via: String,
    pub employer_id: String,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::saved_job::Entity")]
    SavedJob,
    #[sea_orm(has_many = "super::applied_job::Entity")]
    AppliedJob,
}

impl Related<super::saved_job::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SavedJob.def()
    }
}

impl Related<super::applied_job::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AppliedJob.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
