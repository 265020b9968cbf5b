// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Months, NaiveDate, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static RELATIVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*\+?\s*(week|day)").expect("valid relative regex"));
static STARTS_IN_RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"starts in (\d+)-(\d+) months").expect("valid range regex"));
static STARTS_WITHIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"starts within (\d+) month").expect("valid within regex"));
static STARTS_ON_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"starts\s*:\s*(\d{1,2})(?:st|nd|rd|th)?\s*([a-z]+)'?\s*(\d{2})")
        .expect("valid starts-on regex")
});

/// 解析站点原生的发布时间字符串为绝对时间
///
/// 站点给出的时间多为相对描述（"3 days ago"、"2 weeks ago"、"just now"），
/// LinkedIn 的 datetime 属性则是 ISO 日期；实习类站点还会出现
/// "Starts in 1-2 months" 这类开始时间描述。无法识别时返回 `None`，
/// 调用方据此跳过时效过滤而不是报错。
///
/// # 参数
///
/// * `raw` - 站点原生时间字符串
/// * `now` - 参考时间，相对时间基于该时间换算
pub fn parse_posted_at(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let s = raw.trim().to_lowercase();
    if s.is_empty() {
        return None;
    }

    // ISO 日期 (LinkedIn time[datetime])
    if let Ok(date) = NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|dt| Utc.from_utc_datetime(&dt));
    }

    if s.contains("just now") || s.contains("few hours ago") || s.contains("today") {
        return Some(now);
    }

    if let Some(caps) = RELATIVE_RE.captures(&s) {
        let number: i64 = caps[1].parse().ok()?;
        let offset_days = if caps[2].starts_with("week") {
            number * 7
        } else {
            number
        };
        return Some(now - chrono::Duration::days(offset_days));
    }

    if let Some(caps) = STARTS_IN_RANGE_RE.captures(&s) {
        let min_months: u32 = caps[1].parse().ok()?;
        return now.checked_add_months(Months::new(min_months));
    }

    if let Some(caps) = STARTS_WITHIN_RE.captures(&s) {
        let months: u32 = caps[1].parse().ok()?;
        return now.checked_add_months(Months::new(months));
    }

    // "Starts : 5th Aug'25"
    if let Some(caps) = STARTS_ON_RE.captures(&s) {
        let day: u32 = caps[1].parse().ok()?;
        let month = month_from_prefix(&caps[2])?;
        let year: i32 = 2000 + caps[3].parse::<i32>().ok()?;
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        return date
            .and_hms_opt(0, 0, 0)
            .map(|dt| Utc.from_utc_datetime(&dt));
    }

    None
}

fn month_from_prefix(name: &str) -> Option<u32> {
    let prefix = name.get(0..3)?;
    match prefix {
        "jan" => Some(1),
        "feb" => Some(2),
        "mar" => Some(3),
        "apr" => Some(4),
        "may" => Some(5),
        "jun" => Some(6),
        "jul" => Some(7),
        "aug" => Some(8),
        "sep" => Some(9),
        "oct" => Some(10),
        "nov" => Some(11),
        "dec" => Some(12),
        _ => None,
    }
}
