// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::{RetentionSettings, ScraperSettings, VerificationSettings};
use crate::domain::models::verification_task::VerificationTask;
use crate::domain::repositories::job_repository::JobRepository;
use crate::queue::task_queue::VerificationQueue;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use metrics::counter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration as TokioDuration};
use tracing::{error, info, warn};

/// 抓取执行入口
///
/// 调度器只认这个接口，具体编排在 worker 层
#[async_trait]
pub trait ScrapeRunner: Send + Sync {
    /// 执行一轮完整抓取
    async fn run(&self) -> anyhow::Result<()>;
}

/// 调度器
///
/// 驱动三类周期工作：定时抓取（单飞令牌保证同一时刻只有
/// 一轮在跑）、临期职位入队验证、过期非活跃职位的保留清理。
/// 另带一个锁看门狗，回收崩溃 worker 留下的过期租约。
pub struct Scheduler {
    job_repo: Arc<dyn JobRepository>,
    queue: Arc<dyn VerificationQueue>,
    scrape_runner: Arc<dyn ScrapeRunner>,
    scraper: ScraperSettings,
    verification: VerificationSettings,
    retention: RetentionSettings,
    scrape_in_flight: Arc<AtomicBool>,
}

impl Scheduler {
    /// 创建新的调度器实例
    pub fn new(
        job_repo: Arc<dyn JobRepository>,
        queue: Arc<dyn VerificationQueue>,
        scrape_runner: Arc<dyn ScrapeRunner>,
        scraper: ScraperSettings,
        verification: VerificationSettings,
        retention: RetentionSettings,
    ) -> Self {
        Self {
            job_repo,
            queue,
            scrape_runner,
            scraper,
            verification,
            retention,
            scrape_in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 启动所有周期任务
    pub fn start(&self) -> Vec<JoinHandle<()>> {
        vec![
            self.start_scrape_trigger(),
            self.start_enqueue_trigger(),
            self.start_retention_sweep(),
            self.start_lock_janitor(),
        ]
    }

    /// 尝试获取抓取单飞令牌
    fn try_begin_scrape(in_flight: &AtomicBool) -> bool {
        in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn start_scrape_trigger(&self) -> JoinHandle<()> {
        let runner = self.scrape_runner.clone();
        let in_flight = self.scrape_in_flight.clone();
        let period = TokioDuration::from_secs(self.scraper.interval_hours * 3600);

        tokio::spawn(async move {
            let mut ticker = interval(period);
            loop {
                ticker.tick().await;

                if !Self::try_begin_scrape(&in_flight) {
                    warn!("Previous scrape run still in flight, skipping this trigger");
                    continue;
                }

                info!("Scrape run triggered");
                if let Err(e) = runner.run().await {
                    error!(error = %e, "Scrape run failed");
                }
                in_flight.store(false, Ordering::Release);
            }
        })
    }

    fn start_enqueue_trigger(&self) -> JoinHandle<()> {
        let job_repo = self.job_repo.clone();
        let queue = self.queue.clone();
        let window_days = self.verification.expiring_window_days;
        let max_retries = self.verification.max_retries as i32;
        let period = TokioDuration::from_secs(self.verification.enqueue_interval_hours * 3600);

        tokio::spawn(async move {
            let mut ticker = interval(period);
            loop {
                ticker.tick().await;

                let cutoff = Utc::now() + Duration::days(window_days);
                let jobs = match job_repo.find_expiring(cutoff).await {
                    Ok(jobs) => jobs,
                    Err(e) => {
                        error!(error = %e, "Expiring-job scan failed");
                        continue;
                    }
                };
                if jobs.is_empty() {
                    continue;
                }

                let tasks: Vec<VerificationTask> = jobs
                    .iter()
                    .map(|job| {
                        VerificationTask::new(job.id, job.source_url.clone(), max_retries)
                    })
                    .collect();
                match queue.enqueue_batch(tasks).await {
                    Ok(enqueued) => {
                        info!(candidates = jobs.len(), enqueued, "Verification tasks enqueued")
                    }
                    Err(e) => error!(error = %e, "Verification enqueue failed"),
                }
            }
        })
    }

    fn start_retention_sweep(&self) -> JoinHandle<()> {
        let job_repo = self.job_repo.clone();
        let inactive_days = self.retention.inactive_days;
        let period = TokioDuration::from_secs(self.retention.sweep_interval_hours * 3600);

        tokio::spawn(async move {
            let mut ticker = interval(period);
            loop {
                ticker.tick().await;

                let cutoff = Utc::now() - Duration::days(inactive_days);
                match job_repo.purge_inactive(cutoff).await {
                    Ok(report) => {
                        if report.jobs_deleted > 0 {
                            counter!("jobs_purged_total").increment(report.jobs_deleted);
                            info!(
                                jobs = report.jobs_deleted,
                                saved = report.saved_deleted,
                                applied = report.applied_deleted,
                                "Retention sweep finished"
                            );
                        }
                    }
                    Err(e) => error!(error = %e, "Retention sweep failed"),
                }
            }
        })
    }

    fn start_lock_janitor(&self) -> JoinHandle<()> {
        let queue = self.queue.clone();

        tokio::spawn(async move {
            let mut ticker = interval(TokioDuration::from_secs(60));
            loop {
                ticker.tick().await;

                match queue.release_expired(Utc::now()).await {
                    Ok(released) => {
                        if released > 0 {
                            info!(released, "Released expired verification task locks");
                        }
                    }
                    Err(e) => error!(error = %e, "Expired lock release failed"),
                }
            }
        })
    }
}
