// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use url::Url;

/// 站点解析器产出的原始职位数据
///
/// 字段直接取自列表页卡片，未做规范化；规范化与默认值填充
/// 由摄入服务负责。`source_url` 是跨站点去重键，解析不到
/// 标题或链接的卡片视为不可用，直接丢弃。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawJobPosting {
    /// 职位标题
    pub title: String,
    /// 职位详情页URL，作为去重键
    pub source_url: String,
    /// 公司名称
    pub company_name: Option<String>,
    /// 公司主页URL
    pub company_url: Option<String>,
    /// 公司 Logo URL
    pub company_logo: Option<String>,
    /// 工作地点
    pub location: Option<String>,
    /// 薪资范围原文
    pub salary_range: Option<String>,
    /// 经验要求原文（如 "0-2 Yrs"）
    pub experience: Option<String>,
    /// 公司评分原文
    pub rating: Option<String>,
    /// 发布时间原文（如 "3 days ago"）
    pub posted_at_raw: Option<String>,
    /// 职位描述摘要
    pub description: Option<String>,
    /// 技能标签
    pub tags: Vec<String>,
}

impl RawJobPosting {
    /// 创建只含必要字段的原始职位
    pub fn new(title: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source_url: source_url.into(),
            company_name: None,
            company_url: None,
            company_logo: None,
            location: None,
            salary_range: None,
            experience: None,
            rating: None,
            posted_at_raw: None,
            description: None,
            tags: Vec::new(),
        }
    }

    /// 判断卡片是否可用于摄入
    ///
    /// 标题与链接缺一不可
    pub fn is_usable(&self) -> bool {
        !self.title.trim().is_empty() && !self.source_url.trim().is_empty()
    }

    /// 提取来源站点主机名，作为 via 字段
    pub fn via_host(&self) -> Option<String> {
        Url::parse(&self.source_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_usable_requires_title_and_url() {
        let posting = RawJobPosting::new("Backend Engineer", "https://example.com/job/1");
        assert!(posting.is_usable());

        let missing_title = RawJobPosting::new("  ", "https://example.com/job/1");
        assert!(!missing_title.is_usable());

        let missing_url = RawJobPosting::new("Backend Engineer", "");
        assert!(!missing_url.is_usable());
    }

    #[test]
    fn test_via_host_strips_www() {
        let posting = RawJobPosting::new("X", "https://www.naukri.com/job-listings-x");
        assert_eq!(posting.via_host(), Some("naukri.com".to_string()));

        let linkedin = RawJobPosting::new("X", "https://in.linkedin.com/jobs/view/123");
        assert_eq!(linkedin.via_host(), Some("in.linkedin.com".to_string()));
    }

    #[test]
    fn test_via_host_invalid_url() {
        let posting = RawJobPosting::new("X", "not a url");
        assert_eq!(posting.via_host(), None);
    }
}
