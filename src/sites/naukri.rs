// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::raw_posting::RawJobPosting;
use crate::sites::SourceSite;
use crate::utils::slug::slugify;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static TITLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("a.title").expect("valid selector"));
static COMPANY_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.comp-name").expect("valid selector"));
static RATING_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".rating .main-2").expect("valid selector"));
static EXP_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".exp span[title]").expect("valid selector"));
static LOC_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".loc span[title]").expect("valid selector"));
static SAL_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".sal span[title]").expect("valid selector"));
static POSTED_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".job-post-day").expect("valid selector"));
static LOGO_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".imagewrap img").expect("valid selector"));
static DESC_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".job-desc").expect("valid selector"));
static TAGS_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("ul.tags li").expect("valid selector"));

static RESULT_COUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"of\s+(\d+)").expect("valid count regex"));

/// Naukri 站点定义
///
/// 经典分页列表，每页 20 条；第一页响应文本带
/// "1 - 20 of N" 形式的结果总数。
pub struct Naukri;

impl SourceSite for Naukri {
    fn name(&self) -> &'static str {
        "naukri"
    }

    fn listing_url(&self, query: &str, page: u32) -> String {
        let slug = slugify(query);
        if page <= 1 {
            format!("https://www.naukri.com/{}-jobs", slug)
        } else {
            format!("https://www.naukri.com/{}-jobs-{}", slug, page)
        }
    }

    fn card_selector(&self) -> &'static str {
        "div.cust-job-tuple"
    }

    fn results_per_page(&self) -> u32 {
        20
    }

    fn parse_result_count(&self, html: &str) -> Option<u64> {
        RESULT_COUNT_RE
            .captures(html)
            .and_then(|caps| caps[1].parse().ok())
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

    let title_el = root.select(&TITLE_SEL).next()?;
    let title = element_text(title_el);
    let source_url = title_el.value().attr("href")?.trim().to_string();
    if title.is_empty() || source_url.is_empty() {
        return None;
    }

    let company_el = root.select(&COMPANY_SEL).next();
    let mut posting = RawJobPosting::new(title, source_url);
    posting.company_name = company_el.map(element_text).filter(|s| !s.is_empty());
    posting.company_url = company_el
        .and_then(|el| el.value().attr("href"))
        .map(|s| s.trim().to_string());
    posting.rating = root
        .select(&RATING_SEL)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty());
    posting.experience = titled_or_text(&root, &EXP_SEL);
    posting.location = titled_or_text(&root, &LOC_SEL);
    posting.salary_range = titled_or_text(&root, &SAL_SEL);
    posting.posted_at_raw = root
        .select(&POSTED_SEL)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty());
    posting.company_logo = root
        .select(&LOGO_SEL)
        .next()
        .and_then(|el| el.value().attr("src"))
        .map(|s| s.to_string());
    posting.description = root
        .select(&DESC_SEL)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty());
    posting.tags = root
        .select(&TAGS_SEL)
        .map(element_text)
        .filter(|s| !s.is_empty())
        .collect();

    Some(posting)
}

/// title 属性优先，缺失时退回元素文本
fn titled_or_text(root: &ElementRef, selector: &Selector) -> Option<String> {
    let el = root.select(selector).next()?;
    let value = el
        .value()
        .attr("title")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| element_text(el));
    (!value.is_empty()).then_some(value)
}

fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}
