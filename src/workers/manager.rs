// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::VerificationSettings;
use crate::domain::repositories::job_repository::JobRepository;
use crate::queue::task_queue::VerificationQueue;
use crate::workers::verification_worker::{LivenessFetcher, VerificationWorker};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 工作器管理器
///
/// 负责启动验证 worker 池并托管所有后台任务句柄，
/// 收到关停信号后统一终止
pub struct WorkerManager {
    queue: Arc<dyn VerificationQueue>,
    job_repo: Arc<dyn JobRepository>,
    fetcher: Arc<dyn LivenessFetcher>,
    settings: VerificationSettings,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerManager {
    /// 创建新的工作器管理器
    pub fn new(
        queue: Arc<dyn VerificationQueue>,
        job_repo: Arc<dyn JobRepository>,
        fetcher: Arc<dyn LivenessFetcher>,
        settings: VerificationSettings,
    ) -> Self {
        Self {
            queue,
            job_repo,
            fetcher,
            settings,
            handles: Vec::new(),
        }
    }

    /// 启动配置数量的验证 worker
    pub fn start_workers(&mut self) {
        for _ in 0..self.settings.worker_count {
            let worker = VerificationWorker::new(
                self.queue.clone(),
                self.job_repo.clone(),
                self.fetcher.clone(),
                &self.settings,
            );
            self.handles.push(tokio::spawn(async move {
                worker.run().await;
            }));
        }
        info!(count = self.settings.worker_count, "Verification workers started");
    }

    /// 托管外部后台任务句柄（调度器的周期任务）
    pub fn adopt(&mut self, handles: Vec<JoinHandle<()>>) {
        self.handles.extend(handles);
    }

    /// 阻塞等待关停信号，然后终止所有后台任务
    pub async fn wait_for_shutdown(&mut self) {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
        info!(tasks = self.handles.len(), "Shutdown signal received, stopping background tasks");
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }
}
