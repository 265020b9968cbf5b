// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// 单个分类及其查询标题
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogCategory {
    /// 分类名称
    pub name: String,
    /// 该分类下的查询标题列表
    pub titles: Vec<String>,
}

/// 查询目录
///
/// 抓取编排器的工作清单：分类 -> 查询标题的有序列表。
/// 从 JSON 对象加载，分类按名称排序以保证检查点恢复时
/// 遍历顺序稳定。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryCatalog {
    pub categories: Vec<CatalogCategory>,
}

impl QueryCatalog {
    /// 从 JSON 文件加载目录
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            DomainError::ValidationError(format!(
                "Failed to read catalog file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_json(&content)
    }

    /// 从 JSON 字符串解析目录
    pub fn from_json(content: &str) -> Result<Self, DomainError> {
        let map: BTreeMap<String, Vec<String>> = serde_json::from_str(content)
            .map_err(|e| DomainError::ValidationError(format!("Invalid catalog JSON: {}", e)))?;

        if map.is_empty() {
            return Err(DomainError::ValidationError(
                "Catalog contains no categories".to_string(),
            ));
        }

        let categories = map
            .into_iter()
            .map(|(name, titles)| CatalogCategory { name, titles })
            .collect();
        Ok(Self { categories })
    }

    /// 目录中查询标题总数
    pub fn title_count(&self) -> usize {
        self.categories.iter().map(|c| c.titles.len()).sum()
    }
}
