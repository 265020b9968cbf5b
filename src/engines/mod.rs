// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 浏览器会话管理
pub mod browser;
/// 列表页抓取驱动
pub mod driver;
/// 结果总数探测
pub mod probe;

pub use browser::BrowserSession;
pub use driver::{PageScrape, ScrapeError, SiteDriver};
pub use probe::PageCountProbe;
