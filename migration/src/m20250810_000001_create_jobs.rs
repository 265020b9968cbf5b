// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

/// 职位表初始迁移
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    /// 应用数据库迁移
    ///
    /// # 参数
    ///
    /// * `manager` - 数据库模式管理器
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 迁移成功
    /// * `Err(DbErr)` - 迁移失败
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Jobs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Jobs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Jobs::Title).string().not_null())
                    .col(ColumnDef::new(Jobs::Category).string().not_null())
                    .col(
                        ColumnDef::new(Jobs::SourceUrl)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Jobs::CompanyName)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Jobs::CompanyUrl)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Jobs::Location)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Jobs::JobType).string().not_null())
                    .col(ColumnDef::new(Jobs::Description).text().not_null().default(""))
                    .col(ColumnDef::new(Jobs::SalaryRange).string().null())
                    .col(ColumnDef::new(Jobs::Tags).json().not_null())
                    .col(
                        ColumnDef::new(Jobs::Rating)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(ColumnDef::new(Jobs::Experience).string().not_null())
                    .col(ColumnDef::new(Jobs::MinExperience).integer().null())
                    .col(ColumnDef::new(Jobs::MaxExperience).integer().null())
                    .col(ColumnDef::new(Jobs::PostedAtRaw).string().not_null().default(""))
                    .col(
                        ColumnDef::new(Jobs::PostedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Jobs::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Jobs::Deadline)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Jobs::LastVerified)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Jobs::CompanyLogo)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Jobs::Via).string().not_null().default(""))
                    .col(
                        ColumnDef::new(Jobs::EmployerId)
                            .string()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Jobs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Jobs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 验证调度依赖 (deadline, is_active) 组合查询
        manager
            .create_index(
                Index::create()
                    .name("idx_jobs_deadline_active")
                    .table(Jobs::Table)
                    .col(Jobs::Deadline)
                    .col(Jobs::IsActive)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_jobs_category")
                    .table(Jobs::Table)
                    .col(Jobs::Category)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    /// 回滚数据库迁移
    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Jobs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Jobs {
    Table,
    Id,
    Title,
    Category,
    SourceUrl,
    CompanyName,
    CompanyUrl,
    Location,
    JobType,
    Description,
    SalaryRange,
    Tags,
    Rating,
    Experience,
    MinExperience,
    MaxExperience,
    PostedAtRaw,
    PostedAt,
    IsActive,
    Deadline,
    LastVerified,
    CompanyLogo,
    Via,
    EmployerId,
    CreatedAt,
    UpdatedAt,
}
