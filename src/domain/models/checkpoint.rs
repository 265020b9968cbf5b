// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::catalog::QueryCatalog;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 抓取游标位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumePosition {
    /// 目录中的分类下标
    pub category_index: usize,
    /// 分类内的标题下标
    pub title_index: usize,
    /// 续抓起始页（1 起）
    pub page: u32,
}

/// 抓取检查点
///
/// 每处理完一页列表后持久化，记录当前分类、查询标题与页码。
/// 进程重启后据此从中断处续抓；若记录的分类或标题在目录中
/// 已不存在（目录被编辑过），则放弃检查点从头开始。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeCheckpoint {
    /// 目标站点名称
    pub site: String,
    /// 当前分类
    pub category: String,
    /// 当前查询标题
    pub title: String,
    /// 下一个待抓取的页码（1 起）
    pub page: u32,
    /// 检查点写入时间
    pub updated_at: DateTime<Utc>,
}

impl ScrapeCheckpoint {
    pub fn new(site: impl Into<String>, category: String, title: String, page: u32) -> Self {
        Self {
            site: site.into(),
            category,
            title,
            page,
            updated_at: Utc::now(),
        }
    }

    /// 在目录中定位检查点对应的续抓位置
    ///
    /// 分类与标题都要求精确匹配；匹配不到返回 `None`，
    /// 调用方应从目录起点重新开始。
    pub fn resume_position(&self, catalog: &QueryCatalog) -> Option<ResumePosition> {
        let (category_index, category) = catalog
            .categories
            .iter()
            .enumerate()
            .find(|(_, c)| c.name == self.category)?;
        let title_index = category.titles.iter().position(|t| *t == self.title)?;
        Some(ResumePosition {
            category_index,
            title_index,
            page: self.page.max(1),
        })
    }
}
