// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::{BrowserSettings, ScraperSettings};
use crate::domain::models::catalog::QueryCatalog;
use crate::domain::models::checkpoint::{ResumePosition, ScrapeCheckpoint};
use crate::domain::repositories::storage_repository::StorageRepository;
use crate::domain::services::ingestion_service::IngestionService;
use crate::engines::browser::BrowserSession;
use crate::engines::driver::SiteDriver;
use crate::engines::probe::PageCountProbe;
use crate::infrastructure::checkpoint_store::CheckpointStore;
use crate::infrastructure::observability::metrics::resources_are_free;
use crate::infrastructure::proxy::ProxySessionManager;
use crate::queue::scheduler::ScrapeRunner;
use crate::sites::SourceSite;
use crate::utils::slug::slugify;
use async_trait::async_trait;
use metrics::{counter, histogram};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// 抓取 worker
///
/// 一轮抓取的完整编排：资源闸门、检查点续抓、代理会话、
/// 浏览器生命周期（按页数回收重建）、分页探测、逐页
/// 抓取-留存-解析-摄入，每页落盘一次检查点。
pub struct ScrapeWorker {
    catalog: QueryCatalog,
    sites: Vec<Arc<dyn SourceSite>>,
    driver: SiteDriver,
    probe: PageCountProbe,
    checkpoints: CheckpointStore,
    storage: Arc<dyn StorageRepository>,
    ingestion: IngestionService,
    proxy: Arc<ProxySessionManager>,
    browser: BrowserSettings,
    scraper: ScraperSettings,
}

impl ScrapeWorker {
    /// 创建新的抓取 worker
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalog: QueryCatalog,
        sites: Vec<Arc<dyn SourceSite>>,
        driver: SiteDriver,
        probe: PageCountProbe,
        checkpoints: CheckpointStore,
        storage: Arc<dyn StorageRepository>,
        ingestion: IngestionService,
        proxy: Arc<ProxySessionManager>,
        browser: BrowserSettings,
        scraper: ScraperSettings,
    ) -> Self {
        Self {
            catalog,
            sites,
            driver,
            probe,
            checkpoints,
            storage,
            ingestion,
            proxy,
            browser,
            scraper,
        }
    }

    /// 跑完一个站点的所有分类与查询标题
    #[instrument(skip(self, site), fields(site = site.name()))]
    async fn run_site(&self, site: &dyn SourceSite) -> anyhow::Result<()> {
        let resume = match self.checkpoints.load(site.name()).await? {
            Some(checkpoint) => {
                let position = checkpoint.resume_position(&self.catalog);
                match position {
                    Some(_) => info!(
                        site = site.name(),
                        category = %checkpoint.category,
                        title = %checkpoint.title,
                        page = checkpoint.page,
                        "Resuming scrape from checkpoint"
                    ),
                    None => warn!(
                        site = site.name(),
                        "Checkpoint no longer matches the catalog, restarting from scratch"
                    ),
                }
                position
            }
            None => None,
        };

        let proxy_handle = self.proxy.open_session().await?;
        let proxy_addr = proxy_handle.as_ref().map(|h| h.local_addr());

        let mut session = BrowserSession::launch(&self.browser, proxy_addr.as_deref()).await?;
        let result = self
            .scrape_site(&mut session, site, resume, proxy_addr.as_deref())
            .await;
        session.close().await;
        drop(proxy_handle);
        result?;

        self.checkpoints.clear(site.name()).await?;
        info!(site = site.name(), "Site scrape finished, checkpoint cleared");
        Ok(())
    }

    async fn scrape_site(
        &self,
        session: &mut BrowserSession,
        site: &dyn SourceSite,
        resume: Option<ResumePosition>,
        proxy_addr: Option<&str>,
    ) -> anyhow::Result<()> {
        let start = resume.unwrap_or(ResumePosition {
            category_index: 0,
            title_index: 0,
            page: 1,
        });

        for (category_index, category) in self
            .catalog
            .categories
            .iter()
            .enumerate()
            .skip(start.category_index)
        {
            let first_title = if category_index == start.category_index {
                start.title_index
            } else {
                0
            };

            for (title_index, title) in category.titles.iter().enumerate().skip(first_title) {
                let start_page =
                    if category_index == start.category_index && title_index == start.title_index {
                        start.page
                    } else {
                        1
                    };
                let total_pages = self.plan_pages(site, title).await;

                for page in start_page..=total_pages {
                    if session.needs_recycle(self.scraper.pages_per_browser) {
                        info!(
                            site = site.name(),
                            pages_served = session.pages_served(),
                            "Recycling browser session"
                        );
                        let fresh = BrowserSession::launch(&self.browser, proxy_addr).await?;
                        let old = std::mem::replace(session, fresh);
                        old.close().await;
                    }

                    self.scrape_page(session, site, &category.name, title, page)
                        .await;

                    let checkpoint = ScrapeCheckpoint::new(
                        site.name(),
                        category.name.clone(),
                        title.clone(),
                        page + 1,
                    );
                    if let Err(e) = self.checkpoints.save(&checkpoint).await {
                        warn!(site = site.name(), error = %e, "Checkpoint save failed");
                    }
                }
            }
        }
        Ok(())
    }

    /// 推算一个查询的总页数
    ///
    /// 探测失败不是致命错误，降级为单页
    async fn plan_pages(&self, site: &dyn SourceSite, title: &str) -> u32 {
        if site.max_pages() == 1 {
            return 1;
        }

        let first_page_url = site.listing_url(title, 1);
        match self.probe.probe_total_pages(site, &first_page_url).await {
            Ok(Some(pages)) => pages.min(site.max_pages()),
            Ok(None) => 1,
            Err(e) => {
                warn!(site = site.name(), title, error = %e, "Page count probe failed, scraping one page");
                1
            }
        }
    }

    /// 抓取单个列表页：抓取、留存片段、解析、摄入
    ///
    /// 重试耗尽的页面跳过并计数，不中断整轮抓取
    async fn scrape_page(
        &self,
        session: &mut BrowserSession,
        site: &dyn SourceSite,
        category: &str,
        title: &str,
        page: u32,
    ) {
        let url = site.listing_url(title, page);
        let slug = slugify(title);
        let failure_key = format!("{}/failures/{}_p{}.png", site.name(), slug, page);

        let scrape = match self
            .driver
            .scrape_listing(session, site, &url, &failure_key)
            .await
        {
            Ok(scrape) => scrape,
            Err(e) => {
                counter!("scrape_pages_failed_total").increment(1);
                warn!(site = site.name(), url, error = %e, "Page scrape failed after retries, skipping");
                return;
            }
        };
        counter!("scrape_pages_total").increment(1);

        for (index, fragment) in scrape.fragments.iter().enumerate() {
            let key = format!("{}/{}_p{}_c{}.html", site.name(), slug, page, index);
            if let Err(e) = self.storage.save(&key, fragment.as_bytes()).await {
                warn!(key, error = %e, "Card fragment persist failed");
            }
        }

        let postings = site.parse(&scrape.fragments);
        let report = self.ingestion.ingest(category, postings, site.name()).await;
        counter!("jobs_ingested_total").increment(report.inserted);
        counter!("jobs_skipped_total").increment(report.skipped);
    }
}

#[async_trait]
impl ScrapeRunner for ScrapeWorker {
    async fn run(&self) -> anyhow::Result<()> {
        if !resources_are_free(self.scraper.max_cpu_percent, self.scraper.max_memory_percent) {
            warn!("System resources saturated, postponing scrape run");
            return Ok(());
        }

        let started = std::time::Instant::now();
        for site in &self.sites {
            if let Err(e) = self.run_site(site.as_ref()).await {
                error!(site = site.name(), error = %e, "Site scrape failed");
            }
        }
        histogram!("scrape_run_duration_seconds").record(started.elapsed().as_secs_f64());
        Ok(())
    }
}
