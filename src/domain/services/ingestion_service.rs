// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::raw_posting::RawJobPosting;
use crate::domain::repositories::job_repository::{JobRepository, NewJob};
use crate::utils::experience::parse_experience;
use crate::utils::posted_at::parse_posted_at;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 单批插入的行数，约束冲突按块隔离
const INSERT_CHUNK_SIZE: usize = 50;

/// 摄入统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    /// 实际插入的职位数
    pub inserted: u64,
    /// 跳过数（不可用卡片、过旧职位、重复 source_url）
    pub skipped: u64,
    /// 失败数（数据库块级错误）
    pub failed: u64,
}

/// 职位摄入服务
///
/// 将站点解析器产出的原始职位规范化后批量落库。
/// 映射是全量且防御性的：缺失字段填充命名默认值，
/// 重复 source_url 由数据库唯一约束静默跳过。
pub struct IngestionService {
    job_repo: Arc<dyn JobRepository>,
    /// 仅摄入最近 N 天内发布的职位；发布时间解析失败的不过滤
    recency_days: i64,
    /// 新职位的初始有效期天数
    deadline_days: i64,
}

impl IngestionService {
    /// 创建新的摄入服务实例
    pub fn new(job_repo: Arc<dyn JobRepository>, recency_days: i64, deadline_days: i64) -> Self {
        Self {
            job_repo,
            recency_days,
            deadline_days,
        }
    }

    /// 摄入一批原始职位
    ///
    /// # 参数
    ///
    /// * `category` - 职位所属分类（来自查询目录）
    /// * `postings` - 站点解析器产出的原始职位
    /// * `default_employer_id` - 站点侧雇主标识缺省值
    ///
    /// # 返回值
    ///
    /// 摄入统计；块级数据库错误被隔离计数，不会中断整批
    pub async fn ingest(
        &self,
        category: &str,
        postings: Vec<RawJobPosting>,
        default_employer_id: &str,
    ) -> IngestReport {
        let now = Utc::now();
        let mut report = IngestReport::default();
        let mut rows = Vec::with_capacity(postings.len());

        for posting in postings {
            if !posting.is_usable() {
                debug!(url = %posting.source_url, "Skipping unusable card");
                report.skipped += 1;
                continue;
            }

            let posted_at = posting
                .posted_at_raw
                .as_deref()
                .and_then(|raw| parse_posted_at(raw, now));

            // Recency filter only applies when the timestamp parsed
            if let Some(posted) = posted_at {
                if now - posted > chrono::Duration::days(self.recency_days) {
                    debug!(url = %posting.source_url, posted_at = %posted, "Skipping stale posting");
                    report.skipped += 1;
                    continue;
                }
            }

            rows.push(self.map_posting(posting, category, posted_at, default_employer_id, now));
        }

        for chunk in rows.chunks(INSERT_CHUNK_SIZE) {
            match self.job_repo.insert_many_skip_duplicates(chunk).await {
                Ok(inserted) => {
                    report.inserted += inserted;
                    report.skipped += chunk.len() as u64 - inserted;
                }
                Err(e) => {
                    warn!(chunk_size = chunk.len(), error = %e, "Insert chunk failed");
                    report.failed += chunk.len() as u64;
                }
            }
        }

        info!(
            category,
            inserted = report.inserted,
            skipped = report.skipped,
            failed = report.failed,
            "Ingest batch finished"
        );
        report
    }

    /// RawJobPosting -> NewJob 的全量字段映射
    fn map_posting(
        &self,
        posting: RawJobPosting,
        category: &str,
        posted_at: Option<DateTime<Utc>>,
        default_employer_id: &str,
        now: DateTime<Utc>,
    ) -> NewJob {
        let experience = posting
            .experience
            .clone()
            .unwrap_or_else(|| "Not Mentioned".to_string());
        let (min_experience, max_experience) = parse_experience(&experience);
        let rating = posting
            .rating
            .as_deref()
            .and_then(|r| r.trim().parse::<f64>().ok())
            .unwrap_or(0.0);
        let via = posting.via_host().unwrap_or_default();

        NewJob {
            title: posting.title.trim().to_string(),
            category: category.to_string(),
            source_url: posting.source_url,
            company_name: posting.company_name.unwrap_or_default(),
            company_url: posting.company_url.unwrap_or_default(),
            // Upstream consumers expect the literal "null" marker here
            location: posting.location.unwrap_or_else(|| "null".to_string()),
            job_type: "Not Mentioned".to_string(),
            description: posting.description.unwrap_or_default(),
            salary_range: Some(
                posting
                    .salary_range
                    .unwrap_or_else(|| "Not Mentioned".to_string()),
            ),
            tags: posting.tags,
            rating,
            experience,
            min_experience,
            max_experience,
            posted_at_raw: posting.posted_at_raw.unwrap_or_default(),
            posted_at,
            deadline: now + chrono::Duration::days(self.deadline_days),
            company_logo: posting.company_logo.unwrap_or_default(),
            via,
            employer_id: default_employer_id.to_string(),
        }
    }
}
