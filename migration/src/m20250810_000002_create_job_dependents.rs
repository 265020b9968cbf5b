// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

/// 职位关联表迁移（收藏与投递记录）
///
/// 留存清理在删除职位前需要先级联删除这两张表中的依赖行
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SavedJobs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SavedJobs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SavedJobs::JobId).integer().not_null())
                    .col(ColumnDef::new(SavedJobs::UserId).integer().not_null())
                    .col(
                        ColumnDef::new(SavedJobs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_saved_jobs_job")
                    .table(SavedJobs::Table)
                    .col(SavedJobs::JobId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AppliedJobs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AppliedJobs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AppliedJobs::JobId).integer().not_null())
                    .col(ColumnDef::new(AppliedJobs::UserId).integer().not_null())
                    .col(
                        ColumnDef::new(AppliedJobs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_applied_jobs_job")
                    .table(AppliedJobs::Table)
                    .col(AppliedJobs::JobId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AppliedJobs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SavedJobs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SavedJobs {
    Table,
    Id,
    JobId,
    UserId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AppliedJobs {
    Table,
    Id,
    JobId,
    UserId,
    CreatedAt,
}
