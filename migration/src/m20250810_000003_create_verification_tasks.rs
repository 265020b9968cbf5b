// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

/// 验证任务队列表迁移
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VerificationTasks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VerificationTasks::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VerificationTasks::JobId).integer().not_null())
                    .col(ColumnDef::new(VerificationTasks::JobUrl).string().not_null())
                    .col(ColumnDef::new(VerificationTasks::Status).string().not_null())
                    .col(
                        ColumnDef::new(VerificationTasks::AttemptCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(VerificationTasks::MaxRetries)
                            .integer()
                            .not_null()
                            .default(3),
                    )
                    .col(
                        ColumnDef::new(VerificationTasks::ScheduledAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(VerificationTasks::EnqueuedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VerificationTasks::StartedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(VerificationTasks::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(VerificationTasks::LastError).text().null())
                    .col(ColumnDef::new(VerificationTasks::LockToken).uuid().null())
                    .col(
                        ColumnDef::new(VerificationTasks::LockExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(VerificationTasks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(VerificationTasks::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Worker 出队按 (status, scheduled_at) 扫描
        manager
            .create_index(
                Index::create()
                    .name("idx_verification_tasks_status_sched")
                    .table(VerificationTasks::Table)
                    .col(VerificationTasks::Status)
                    .col(VerificationTasks::ScheduledAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_verification_tasks_job")
                    .table(VerificationTasks::Table)
                    .col(VerificationTasks::JobId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(VerificationTasks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum VerificationTasks {
    Table,
    Id,
    JobId,
    JobUrl,
    Status,
    AttemptCount,
    MaxRetries,
    ScheduledAt,
    EnqueuedAt,
    StartedAt,
    CompletedAt,
    LastError,
    LockToken,
    LockExpiresAt,
    CreatedAt,
    UpdatedAt,
}
