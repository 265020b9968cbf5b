// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::config::settings::ScraperSettings;
use crate::domain::repositories::storage_repository::{StorageError, StorageRepository};
use crate::engines::browser::BrowserSession;
use crate::sites::SourceSite;
use crate::utils::retry_policy::RetryPolicy;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::{Page, ScreenshotParams};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// 抓取错误类型
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// 浏览器启动失败
    #[error("Browser launch failed: {0}")]
    Launch(String),
    /// CDP 协议错误
    #[error("Browser error: {0}")]
    Browser(#[from] CdpError),
    /// 页面导航失败或超时
    #[error("Navigation failed: {0}")]
    Navigation(String),
    /// 等待选择器超时
    #[error("Timed out waiting for selector: {0}")]
    SelectorTimeout(String),
    /// 页面脚本求值失败
    #[error("Evaluate failed: {0}")]
    Evaluate(String),
    /// 存储错误
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ScrapeError {
    /// 判断错误是否为瞬态，值得换新页面重试
    pub fn is_transient(&self) -> bool {
        match self {
            ScrapeError::Browser(e) => {
                let msg = e.to_string().to_lowercase();
                msg.contains("detached")
                    || msg.contains("timeout")
                    || msg.contains("connection")
                    || msg.contains("channel")
            }
            ScrapeError::Navigation(_) | ScrapeError::SelectorTimeout(_) => true,
            ScrapeError::Launch(_) | ScrapeError::Evaluate(_) | ScrapeError::Storage(_) => false,
        }
    }
}

/// 单页抓取结果
#[derive(Debug, Clone)]
pub struct PageScrape {
    /// 每张职位卡片的 outerHTML
    pub fragments: Vec<String>,
}

/// 列表页抓取驱动
///
/// 负责把一个列表页 URL 变成一组卡片 HTML 片段：导航、
/// 弹窗处理、滚动加载、片段采集。瞬态失败（detached frame、
/// 导航超时）换新页面重试，耗尽后带失败截图返回错误。
pub struct SiteDriver {
    storage: Arc<dyn StorageRepository>,
    navigation_timeout: Duration,
    selector_timeout: Duration,
    retry_policy: RetryPolicy,
    scroll_iteration_cap: u32,
    scroll_stable_rounds: u32,
}

impl SiteDriver {
    /// 创建新的抓取驱动
    pub fn new(
        storage: Arc<dyn StorageRepository>,
        navigation_timeout: Duration,
        selector_timeout: Duration,
        scraper: &ScraperSettings,
    ) -> Self {
        let retry_policy = RetryPolicy {
            max_retries: scraper.page_retries,
            ..RetryPolicy::navigation()
        };
        Self {
            storage,
            navigation_timeout,
            selector_timeout,
            retry_policy,
            scroll_iteration_cap: scraper.scroll_iteration_cap,
            scroll_stable_rounds: scraper.scroll_stable_rounds,
        }
    }

    /// 抓取一个列表页
    ///
    /// # 参数
    ///
    /// * `session` - 浏览器会话，每次尝试都开新页面
    /// * `site` - 目标站点定义
    /// * `url` - 列表页URL
    /// * `failure_key` - 失败截图的存储键
    pub async fn scrape_listing(
        &self,
        session: &mut BrowserSession,
        site: &dyn SourceSite,
        url: &str,
        failure_key: &str,
    ) -> Result<PageScrape, ScrapeError> {
        let mut attempt = 0u32;
        loop {
            match self.scrape_once(session, site, url, failure_key).await {
                Ok(scrape) => return Ok(scrape),
                Err(e) => {
                    attempt += 1;
                    if !e.is_transient() || !self.retry_policy.should_retry(attempt) {
                        return Err(e);
                    }
                    let backoff = self.retry_policy.calculate_backoff(attempt);
                    warn!(
                        url,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Listing scrape failed, retrying with a fresh page"
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    /// 单次尝试：开页面、驱动、关页面
    ///
    /// 页面在所有退出路径上都会关闭
    async fn scrape_once(
        &self,
        session: &mut BrowserSession,
        site: &dyn SourceSite,
        url: &str,
        failure_key: &str,
    ) -> Result<PageScrape, ScrapeError> {
        let page = session.new_page().await?;
        let result = self.drive_page(&page, site, url).await;

        if result.is_err() {
            self.capture_failure(&page, failure_key).await;
        }
        if let Err(e) = page.close().await {
            debug!(error = %e, "Page close failed");
        }
        result
    }

    async fn drive_page(
        &self,
        page: &Page,
        site: &dyn SourceSite,
        url: &str,
    ) -> Result<PageScrape, ScrapeError> {
        match tokio::time::timeout(self.navigation_timeout, page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(ScrapeError::Browser(e)),
            Err(_) => {
                return Err(ScrapeError::Navigation(format!(
                    "timeout after {:?} for {}",
                    self.navigation_timeout, url
                )))
            }
        }

        // Sites throw login/notification popups that cover the listing
        if let Some(popup) = site.popup_selector() {
            if let Ok(el) = page.find_element(popup).await {
                if el.click().await.is_ok() {
                    debug!(selector = popup, "Dismissed popup");
                }
            }
        }

        self.wait_for_selector(page, site.card_selector()).await?;

        if site.uses_infinite_scroll() {
            self.exhaust_scroll(page, site).await?;
        }

        let fragments = self.collect_fragments(page, site.card_selector()).await?;
        debug!(url, cards = fragments.len(), "Listing page scraped");
        Ok(PageScrape { fragments })
    }

    /// 轮询等待选择器出现
    async fn wait_for_selector(&self, page: &Page, selector: &str) -> Result<(), ScrapeError> {
        let deadline = tokio::time::Instant::now() + self.selector_timeout;
        loop {
            if page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(ScrapeError::SelectorTimeout(selector.to_string()));
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
    }

    /// 滚动到底并点击加载更多，直到卡片数稳定或达到迭代上限
    async fn exhaust_scroll(&self, page: &Page, site: &dyn SourceSite) -> Result<(), ScrapeError> {
        let mut previous_count = self.count_cards(page, site.card_selector()).await?;
        let mut stable_rounds = 0u32;

        for iteration in 0..self.scroll_iteration_cap {
            page.evaluate("window.scrollTo(0, document.body.scrollHeight)")
                .await?;
            // Human-ish pause between scroll steps
            tokio::time::sleep(Duration::from_millis(rand::random_range(600..1400))).await;

            if let Some(load_more) = site.load_more_selector() {
                if let Ok(button) = page.find_element(load_more).await {
                    if button.click().await.is_ok() {
                        debug!(iteration, "Clicked load-more");
                        tokio::time::sleep(Duration::from_millis(rand::random_range(800..1600)))
                            .await;
                    }
                }
            }

            let count = self.count_cards(page, site.card_selector()).await?;
            if count == previous_count {
                stable_rounds += 1;
                if stable_rounds >= self.scroll_stable_rounds {
                    debug!(iteration, cards = count, "Scroll converged");
                    break;
                }
            } else {
                stable_rounds = 0;
                previous_count = count;
            }
        }
        Ok(())
    }

    async fn count_cards(&self, page: &Page, selector: &str) -> Result<u64, ScrapeError> {
        let expr = format!("document.querySelectorAll('{}').length", selector);
        page.evaluate(expr.as_str())
            .await?
            .into_value::<u64>()
            .map_err(|e| ScrapeError::Evaluate(e.to_string()))
    }

    async fn collect_fragments(
        &self,
        page: &Page,
        selector: &str,
    ) -> Result<Vec<String>, ScrapeError> {
        let expr = format!(
            "Array.from(document.querySelectorAll('{}')).map(e => e.outerHTML)",
            selector
        );
        page.evaluate(expr.as_str())
            .await?
            .into_value::<Vec<String>>()
            .map_err(|e| ScrapeError::Evaluate(e.to_string()))
    }

    /// 失败时留存截图，便于事后排查选择器漂移
    async fn capture_failure(&self, page: &Page, failure_key: &str) {
        let params = ScreenshotParams::builder().full_page(true).build();
        match page.screenshot(params).await {
            Ok(bytes) => {
                if let Err(e) = self.storage.save(failure_key, &bytes).await {
                    warn!(key = failure_key, error = %e, "Failed to persist failure screenshot");
                }
            }
            Err(e) => warn!(error = %e, "Failure screenshot capture failed"),
        }
    }
}
