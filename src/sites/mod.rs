// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::raw_posting::RawJobPosting;
use std::sync::Arc;

/// LinkedIn 列表页解析
pub mod linkedin;
/// Naukri 列表页解析
pub mod naukri;

/// 职位来源站点特质
///
/// 每个站点定义自己的 URL 形态、卡片选择器与解析规则。
/// 驱动与编排器只依赖该接口，新增站点不触碰抓取流程。
pub trait SourceSite: Send + Sync {
    /// 站点名称，用于日志与存储键前缀
    fn name(&self) -> &'static str;

    /// 构造查询的列表页URL
    ///
    /// # 参数
    ///
    /// * `query` - 查询目录中的原始标题
    /// * `page` - 页码（1 起）
    fn listing_url(&self, query: &str, page: u32) -> String;

    /// 职位卡片选择器
    fn card_selector(&self) -> &'static str;

    /// 覆盖列表的弹窗关闭按钮选择器
    fn popup_selector(&self) -> Option<&'static str> {
        None
    }

    /// "加载更多"按钮选择器
    fn load_more_selector(&self) -> Option<&'static str> {
        None
    }

    /// 是否无限滚动加载（单页站点）
    fn uses_infinite_scroll(&self) -> bool {
        false
    }

    /// 每页结果数，用于总页数推算
    fn results_per_page(&self) -> u32 {
        20
    }

    /// 分页上限；无限滚动站点只有一页
    fn max_pages(&self) -> u32 {
        u32::MAX
    }

    /// 从第一页响应文本解析结果总数
    fn parse_result_count(&self, _html: &str) -> Option<u64> {
        None
    }

    /// 把卡片 HTML 片段解析为原始职位
    ///
    /// 解析不出标题或链接的卡片直接丢弃
    fn parse(&self, fragments: &[String]) -> Vec<RawJobPosting>;
}

/// 所有已接入的站点
pub fn all_sites() -> Vec<Arc<dyn SourceSite>> {
    vec![Arc::new(naukri::Naukri), Arc::new(linkedin::LinkedIn)]
}
