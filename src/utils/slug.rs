// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use deunicode::deunicode;

/// 将查询标题转换为站点 URL 使用的 slug
///
/// 例如 "Backend Engineer" -> "backend-engineer"，
/// 同时用于 HTML 片段与截图的存储键
pub fn slugify(title: &str) -> String {
    let ascii = deunicode(title).to_lowercase();

    let mut slug = String::with_capacity(ascii.len());
    let mut last_dash = true; // Trim leading separators
    for ch in ascii.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    if slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Backend Engineer"), "backend-engineer");
        assert_eq!(slugify("UI/UX Designer"), "ui-ux-designer");
    }

    #[test]
    fn test_slugify_collapses_whitespace() {
        assert_eq!(slugify("  Data   Scientist "), "data-scientist");
    }

    #[test]
    fn test_slugify_unicode() {
        assert_eq!(slugify("Développeur Sénior"), "developpeur-senior");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("---"), "");
    }
}
