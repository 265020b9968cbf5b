// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;

static RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*-\s*(\d+)").expect("valid range regex"));
static SINGLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*\+?\s*(?:yrs?|years?)").expect("valid single regex"));

/// 解析经验年限文本为 (最小, 最大) 年限
///
/// 站点常见格式："0-2 Yrs"、"5-10 Yrs"、"3 Yrs"、"10+ Yrs"，
/// 其中连字符可能是 en-dash 或 em-dash。含 "not"（Not disclosed /
/// Not Mentioned）或无法识别的文本返回 `(None, None)`。
pub fn parse_experience(raw: &str) -> (Option<i32>, Option<i32>) {
    let normalized = raw
        .trim()
        .to_lowercase()
        .replace(['\u{2013}', '\u{2014}'], "-");
    if normalized.is_empty() || normalized.contains("not") {
        return (None, None);
    }

    if let Some(caps) = RANGE_RE.captures(&normalized) {
        let min = caps[1].parse().ok();
        let max = caps[2].parse().ok();
        return (min, max);
    }

    if let Some(caps) = SINGLE_RE.captures(&normalized) {
        let value: Option<i32> = caps[1].parse().ok();
        return (value, value);
    }

    (None, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_experience("0-2 Yrs"), (Some(0), Some(2)));
        assert_eq!(parse_experience("5 - 10 Yrs"), (Some(5), Some(10)));
    }

    #[test]
    fn test_parse_range_with_unicode_dash() {
        assert_eq!(parse_experience("2\u{2013}4 Yrs"), (Some(2), Some(4)));
        assert_eq!(parse_experience("1\u{2014}3 years"), (Some(1), Some(3)));
    }

    #[test]
    fn test_parse_single_value() {
        assert_eq!(parse_experience("3 Yrs"), (Some(3), Some(3)));
        assert_eq!(parse_experience("10+ Yrs"), (Some(10), Some(10)));
    }

    #[test]
    fn test_parse_not_disclosed() {
        assert_eq!(parse_experience("Not disclosed"), (None, None));
        assert_eq!(parse_experience("Not Mentioned"), (None, None));
        assert_eq!(parse_experience(""), (None, None));
        assert_eq!(parse_experience("Fresher"), (None, None));
    }
}
