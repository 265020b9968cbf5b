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

use jobharvest::config::settings::Settings;
use jobharvest::domain::models::catalog::QueryCatalog;
use jobharvest::domain::repositories::job_repository::JobRepository;
use jobharvest::domain::services::ingestion_service::IngestionService;
use jobharvest::engines::driver::SiteDriver;
use jobharvest::engines::probe::PageCountProbe;
use jobharvest::infrastructure::checkpoint_store::CheckpointStore;
use jobharvest::infrastructure::database::connection;
use jobharvest::infrastructure::observability::metrics::init_metrics;
use jobharvest::infrastructure::proxy::ProxySessionManager;
use jobharvest::infrastructure::repositories::job_repo_impl::JobRepositoryImpl;
use jobharvest::infrastructure::repositories::verification_task_repo_impl::VerificationTaskRepositoryImpl;
use jobharvest::infrastructure::storage::create_storage_repository;
use jobharvest::queue::scheduler::{Scheduler, ScrapeRunner};
use jobharvest::queue::task_queue::{DatabaseVerificationQueue, VerificationQueue};
use jobharvest::sites::all_sites;
use jobharvest::utils::telemetry;
use jobharvest::workers::manager::WorkerManager;
use jobharvest::workers::scrape_worker::ScrapeWorker;
use jobharvest::workers::verification_worker::BrowserLivenessFetcher;
use migration::{Migrator, MigratorTrait};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动后台任务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting jobharvest...");

    // 2. Load configuration
    let settings = Settings::new()?;
    info!("Configuration loaded");

    // Initialize Prometheus Metrics
    init_metrics(&settings.metrics);

    // 3. Connect to database
    let db = connection::create_pool(&settings.database).await?;
    let db = Arc::new(db);
    info!("Database connection established");

    // Run database migrations
    info!("Running database migrations...");
    Migrator::up(db.as_ref(), None).await?;
    info!("Database migrations applied");

    // 4. Load the query catalog
    let catalog = QueryCatalog::load(&settings.scraper.catalog_path)?;
    info!(
        categories = catalog.categories.len(),
        titles = catalog.title_count(),
        "Query catalog loaded"
    );

    // 5. Initialize Components
    let job_repo: Arc<dyn JobRepository> = Arc::new(JobRepositoryImpl::new(db.clone()));
    let task_repo = Arc::new(VerificationTaskRepositoryImpl::new(
        db.clone(),
        chrono::Duration::seconds(settings.verification.lock_timeout_secs as i64),
    ));
    let queue: Arc<dyn VerificationQueue> = Arc::new(DatabaseVerificationQueue::new(task_repo));

    let storage = create_storage_repository(&settings.storage)?;
    let proxy = Arc::new(ProxySessionManager::new(&settings.proxy)?);

    let navigation_timeout = Duration::from_secs(settings.browser.navigation_timeout_secs);
    let selector_timeout = Duration::from_secs(settings.browser.selector_timeout_secs);
    let driver = SiteDriver::new(
        storage.clone(),
        navigation_timeout,
        selector_timeout,
        &settings.scraper,
    );
    let probe = PageCountProbe::new(navigation_timeout)?;
    let checkpoints = CheckpointStore::new(storage.clone());

    let ingestion = IngestionService::new(
        job_repo.clone(),
        settings.scraper.recency_days,
        settings.verification.renewal_days,
    );

    let scrape_runner: Arc<dyn ScrapeRunner> = Arc::new(ScrapeWorker::new(
        catalog,
        all_sites(),
        driver,
        probe,
        checkpoints,
        storage.clone(),
        ingestion,
        proxy.clone(),
        settings.browser.clone(),
        settings.scraper.clone(),
    ));

    // 6. Start Workers
    let fetcher = Arc::new(BrowserLivenessFetcher::new(
        proxy.clone(),
        settings.browser.clone(),
    ));
    let mut worker_manager = WorkerManager::new(
        queue.clone(),
        job_repo.clone(),
        fetcher,
        settings.verification.clone(),
    );
    worker_manager.start_workers();

    // 7. Start the Scheduler
    let scheduler = Scheduler::new(
        job_repo,
        queue,
        scrape_runner,
        settings.scraper.clone(),
        settings.verification.clone(),
        settings.retention.clone(),
    );
    worker_manager.adopt(scheduler.start());
    info!("Scheduler started");

    // 8. Run until shutdown
    worker_manager.wait_for_shutdown().await;
    info!("Shutdown complete");
    Ok(())
}
