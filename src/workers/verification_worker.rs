// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::{BrowserSettings, VerificationSettings};
use crate::domain::models::verification_task::VerificationTask;
use crate::domain::repositories::job_repository::JobRepository;
use crate::domain::services::liveness::{classify_liveness, LivenessVerdict};
use crate::engines::browser::BrowserSession;
use crate::engines::driver::ScrapeError;
use crate::infrastructure::proxy::{ProxyError, ProxySessionManager};
use crate::queue::task_queue::VerificationQueue;
use crate::utils::retry_policy::RetryPolicy;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use chromiumoxide::page::Page;
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// 活性抓取错误类型
#[derive(Error, Debug)]
pub enum FetchError {
    /// 代理错误
    #[error("Proxy error: {0}")]
    Proxy(#[from] ProxyError),
    /// 浏览器抓取错误
    #[error(transparent)]
    Scrape(#[from] ScrapeError),
}

impl FetchError {
    /// 瞬态错误走重试退避，其余直接进死信
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Proxy(ProxyError::Io(_)) => true,
            FetchError::Proxy(_) => false,
            FetchError::Scrape(e) => e.is_transient(),
        }
    }
}

/// 职位详情页文本抓取特质
///
/// worker 对活性检查只需要页面文本，具体怎么拿到
/// （浏览器、代理）藏在实现后面
#[async_trait]
pub trait LivenessFetcher: Send + Sync {
    /// 抓取详情页的可见文本
    async fn fetch_page_text(&self, url: &str) -> Result<String, FetchError>;
}

/// 基于浏览器的详情页抓取器
///
/// 每个任务开一个独立的代理会话与浏览器实例，结束时
/// 无论成败都拆除，任务之间互不污染指纹。
pub struct BrowserLivenessFetcher {
    proxy: Arc<ProxySessionManager>,
    browser: BrowserSettings,
    navigation_timeout: Duration,
}

impl BrowserLivenessFetcher {
    /// 创建新的浏览器抓取器
    pub fn new(proxy: Arc<ProxySessionManager>, browser: BrowserSettings) -> Self {
        let navigation_timeout = Duration::from_secs(browser.navigation_timeout_secs);
        Self {
            proxy,
            browser,
            navigation_timeout,
        }
    }

    async fn fetch_with_session(
        &self,
        session: &mut BrowserSession,
        url: &str,
    ) -> Result<String, FetchError> {
        let page = session.new_page().await.map_err(FetchError::Scrape)?;
        let result = self.read_page_text(&page, url).await;
        if let Err(e) = page.close().await {
            debug!(error = %e, "Page close failed");
        }
        result
    }

    async fn read_page_text(&self, page: &Page, url: &str) -> Result<String, FetchError> {
        match tokio::time::timeout(self.navigation_timeout, page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(ScrapeError::Browser(e).into()),
            Err(_) => {
                return Err(ScrapeError::Navigation(format!(
                    "timeout after {:?} for {}",
                    self.navigation_timeout, url
                ))
                .into())
            }
        }

        let text = page
            .evaluate("document.body ? document.body.innerText : ''")
            .await
            .map_err(ScrapeError::Browser)?
            .into_value::<String>()
            .map_err(|e| ScrapeError::Evaluate(e.to_string()))?;
        Ok(text)
    }
}

#[async_trait]
impl LivenessFetcher for BrowserLivenessFetcher {
    async fn fetch_page_text(&self, url: &str) -> Result<String, FetchError> {
        let proxy_handle = self.proxy.open_session().await?;
        let proxy_addr = proxy_handle.as_ref().map(|h| h.local_addr());

        let mut session = BrowserSession::launch(&self.browser, proxy_addr.as_deref())
            .await
            .map_err(FetchError::Scrape)?;
        let result = self.fetch_with_session(&mut session, url).await;
        session.close().await;
        drop(proxy_handle);

        result
    }
}

/// 验证 worker
///
/// 从队列领取任务，打开职位详情页判定活性：
/// 仍有效则续期 deadline，已关闭则标记非活跃（deadline 不变），
/// 瞬态失败按指数退避推迟重试，重试耗尽进死信且不动职位记录。
pub struct VerificationWorker {
    id: Uuid,
    queue: Arc<dyn VerificationQueue>,
    job_repo: Arc<dyn JobRepository>,
    fetcher: Arc<dyn LivenessFetcher>,
    retry_policy: RetryPolicy,
    renewal_days: i64,
    poll_interval: Duration,
}

impl VerificationWorker {
    /// 创建新的验证 worker
    pub fn new(
        queue: Arc<dyn VerificationQueue>,
        job_repo: Arc<dyn JobRepository>,
        fetcher: Arc<dyn LivenessFetcher>,
        settings: &VerificationSettings,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            queue,
            job_repo,
            fetcher,
            retry_policy: RetryPolicy::verification(),
            renewal_days: settings.renewal_days,
            poll_interval: Duration::from_secs(settings.poll_interval_secs),
        }
    }

    /// worker 主循环：领取、处理、空闲时轮询
    pub async fn run(&self) {
        info!(worker_id = %self.id, "Verification worker started");
        loop {
            match self.queue.dequeue(self.id).await {
                Ok(Some(task)) => {
                    let started = std::time::Instant::now();
                    if let Err(e) = self.process(task).await {
                        error!(worker_id = %self.id, error = %e, "Task processing failed");
                    }
                    histogram!("verification_duration_seconds")
                        .record(started.elapsed().as_secs_f64());
                }
                Ok(None) => tokio::time::sleep(self.poll_interval).await,
                Err(e) => {
                    error!(worker_id = %self.id, error = %e, "Dequeue failed");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }
    }

    /// 处理单个验证任务
    #[instrument(skip(self, task), fields(task_id = %task.id, job_id = task.job_id, url = %task.job_url))]
    pub async fn process(&self, task: VerificationTask) -> anyhow::Result<()> {
        debug!(task_id = %task.id, job_id = task.job_id, attempt = task.attempt_count, "Verifying job");

        match self.fetcher.fetch_page_text(&task.job_url).await {
            Ok(text) => match classify_liveness(&text) {
                LivenessVerdict::Live => {
                    let now = Utc::now();
                    let new_deadline = now + ChronoDuration::days(self.renewal_days);
                    self.job_repo
                        .renew_deadline(task.job_id, new_deadline, now)
                        .await?;
                    self.queue.complete(task.id).await?;
                    counter!("verification_tasks_completed_total").increment(1);
                    info!(job_id = task.job_id, %new_deadline, "Job verified live, deadline renewed");
                }
                LivenessVerdict::Closed(phrase) => {
                    self.job_repo.mark_inactive(task.job_id).await?;
                    self.queue.complete(task.id).await?;
                    counter!("verification_tasks_completed_total").increment(1);
                    info!(job_id = task.job_id, phrase, "Job closed, marked inactive");
                }
            },
            Err(e) if e.is_transient() && task.can_retry() => {
                let next_attempt_at = self
                    .retry_policy
                    .next_retry_time(task.attempt_count as u32, Utc::now());
                warn!(
                    task_id = %task.id,
                    job_id = task.job_id,
                    attempt = task.attempt_count,
                    %next_attempt_at,
                    error = %e,
                    "Verification failed, rescheduled"
                );
                self.queue
                    .retry_later(task.id, &e.to_string(), next_attempt_at)
                    .await?;
            }
            Err(e) => {
                // Retries exhausted or permanent failure: the job row is left untouched
                warn!(
                    task_id = %task.id,
                    job_id = task.job_id,
                    attempt = task.attempt_count,
                    error = %e,
                    "Verification inconclusive, task dead-lettered"
                );
                self.queue.dead_letter(task.id, &e.to_string()).await?;
                counter!("verification_tasks_dead_lettered_total").increment(1);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "verification_worker_test.rs"]
mod tests;
