// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::raw_posting::RawJobPosting;
use crate::sites::SourceSite;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use url::Url;

static TITLE_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".base-search-card__title").expect("valid selector"));
static LINK_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.base-card__full-link").expect("valid selector"));
static COMPANY_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".base-search-card__subtitle a").expect("valid selector"));
static LOCATION_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".job-search-card__location").expect("valid selector"));
static LOGO_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img.artdeco-entity-image").expect("valid selector"));
static TIME_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("time[datetime]").expect("valid selector"));

/// LinkedIn 站点定义
///
/// 访客搜索页是单页无限滚动，卡片通过滚动与
/// "See more jobs" 按钮增量加载；发布时间取
/// time 元素的 datetime 属性（ISO 日期）。
pub struct LinkedIn;

impl SourceSite for LinkedIn {
    fn name(&self) -> &'static str {
        "linkedin"
    }

    fn listing_url(&self, query: &str, _page: u32) -> String {
        match Url::parse_with_params(
            "https://www.linkedin.com/jobs/search",
            &[("keywords", query), ("position", "1"), ("pageNum", "0")],
        ) {
            Ok(url) => url.to_string(),
            // Url::parse_with_params on a constant base only fails on query edge cases
            Err(_) => "https://www.linkedin.com/jobs/search".to_string(),
        }
    }

    fn card_selector(&self) -> &'static str {
        "div.base-card"
    }

    fn popup_selector(&self) -> Option<&'static str> {
        Some("button.modal__dismiss")
    }

    fn load_more_selector(&self) -> Option<&'static str> {
        Some("button.infinite-scroller__show-more-button")
    }

    fn uses_infinite_scroll(&self) -> bool {
        true
    }

    fn results_per_page(&self) -> u32 {
        25
    }

    fn max_pages(&self) -> u32 {
        1
    }

    fn parse(&self, fragments: &[String]) -> Vec<RawJobPosting> {
        fragments
            .iter()
            .filter_map(|fragment| parse_card(fragment))
            .collect()
    }
}

fn parse_card(fragment: &str) -> Option<RawJobPosting> {
    let doc = Html::parse_fragment(fragment);
    let root = doc.root_element();

    let title = root.select(&TITLE_SEL).next().map(element_text)?;
    let source_url = root
        .select(&LINK_SEL)
        .next()
        .and_then(|el| el.value().attr("href"))
        .map(|href| strip_tracking(href))?;
    if title.is_empty() || source_url.is_empty() {
        return None;
    }

    let company_el = root.select(&COMPANY_SEL).next();
    let mut posting = RawJobPosting::new(title, source_url);
    posting.company_name = company_el.map(element_text).filter(|s| !s.is_empty());
    posting.company_url = company_el
        .and_then(|el| el.value().attr("href"))
        .map(|href| strip_tracking(href));
    posting.location = root
        .select(&LOCATION_SEL)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty());
    posting.company_logo = root.select(&LOGO_SEL).next().and_then(logo_url);
    posting.posted_at_raw = root
        .select(&TIME_SEL)
        .next()
        .and_then(|el| el.value().attr("datetime"))
        .map(|s| s.trim().to_string());

    Some(posting)
}

/// 懒加载的 Logo 真实地址藏在 data-* 属性里
fn logo_url(el: ElementRef) -> Option<String> {
    let v = el.value();
    v.attr("src")
        .or_else(|| v.attr("data-delayed-url"))
        .or_else(|| v.attr("data-ghost-url"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// 去掉链接上的跟踪参数，保证 source_url 可作去重键
fn strip_tracking(href: &str) -> String {
    match Url::parse(href.trim()) {
        Ok(mut url) => {
            url.set_query(None);
            url.to_string()
        }
        Err(_) => href.trim().to_string(),
    }
}

fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD: &str = r#"
    <div class="base-card">
      <a class="base-card__full-link"
         href="https://in.linkedin.com/jobs/view/backend-engineer-at-acme-3945?refId=abc&trackingId=xyz">
        <span class="sr-only">Backend Engineer</span>
      </a>
      <div class="base-search-card__info">
        <h3 class="base-search-card__title">Backend Engineer</h3>
        <h4 class="base-search-card__subtitle">
          <a href="https://in.linkedin.com/company/acme?trk=public_jobs">Acme Corp</a>
        </h4>
        <span class="job-search-card__location">Bengaluru, Karnataka, India</span>
        <time class="job-search-card__listdate" datetime="2025-08-01">1 week ago</time>
      </div>
      <img class="artdeco-entity-image"
           data-delayed-url="https://media.licdn.com/dms/image/acme-logo.png">
    </div>
    "#;

    #[test]
    fn test_parse_full_card() {
        let postings = LinkedIn.parse(&[CARD.to_string()]);
        assert_eq!(postings.len(), 1);

        let p = &postings[0];
        assert_eq!(p.title, "Backend Engineer");
        assert_eq!(
            p.source_url,
            "https://in.linkedin.com/jobs/view/backend-engineer-at-acme-3945"
        );
        assert_eq!(p.company_name.as_deref(), Some("Acme Corp"));
        assert_eq!(
            p.company_url.as_deref(),
            Some("https://in.linkedin.com/company/acme")
        );
        assert_eq!(p.location.as_deref(), Some("Bengaluru, Karnataka, India"));
        assert_eq!(
            p.company_logo.as_deref(),
            Some("https://media.licdn.com/dms/image/acme-logo.png")
        );
        assert_eq!(p.posted_at_raw.as_deref(), Some("2025-08-01"));
    }

    #[test]
    fn test_card_without_link_dropped() {
        let fragment = r#"
        <div class="base-card">
          <h3 class="base-search-card__title">Ghost Job</h3>
        </div>
        "#;
        assert!(LinkedIn.parse(&[fragment.to_string()]).is_empty());
    }

    #[test]
    fn test_listing_url_encodes_query() {
        let url = LinkedIn.listing_url("Backend Engineer", 1);
        assert!(url.starts_with("https://www.linkedin.com/jobs/search?"));
        assert!(url.contains("keywords=Backend+Engineer") || url.contains("keywords=Backend%20Engineer"));
    }

    #[test]
    fn test_single_page_site() {
        assert_eq!(LinkedIn.max_pages(), 1);
        assert!(LinkedIn.uses_infinite_scroll());
    }
}
