// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::MetricsSettings;
use metrics::{describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::Lazy;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};
use tracing::{debug, warn};

static SYSTEM: Lazy<Arc<Mutex<System>>> = Lazy::new(|| {
    let mut sys = System::new_with_specifics(
        RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::everything())
            .with_memory(MemoryRefreshKind::everything()),
    );
    sys.refresh_all();
    Arc::new(Mutex::new(sys))
});

/// 初始化指标系统
///
/// 安装 Prometheus 导出器并注册应用所需的各类监控指标
pub fn init_metrics(settings: &MetricsSettings) {
    if !settings.enabled {
        debug!("Metrics exporter disabled by configuration");
        return;
    }

    let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), settings.port);
    let builder = PrometheusBuilder::new().with_http_listener(addr);
    if let Err(e) = builder.install() {
        warn!(error = %e, "Failed to install Prometheus recorder, metrics disabled");
        return;
    }

    // Start background task to update system metrics
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(5));
        loop {
            interval.tick().await;
            update_system_metrics();
        }
    });

    // Register metrics
    describe_gauge!("system_cpu_usage_ratio", "Current CPU usage ratio (0.0 to 1.0)");
    describe_gauge!("system_memory_usage_ratio", "Current memory usage ratio (0.0 to 1.0)");
    describe_counter!("scrape_pages_total", "Total number of listing pages scraped");
    describe_counter!("scrape_pages_failed_total", "Total number of listing pages that failed after retries");
    describe_counter!("jobs_ingested_total", "Total number of jobs inserted");
    describe_counter!("jobs_skipped_total", "Total number of postings skipped during ingest");
    describe_counter!("verification_tasks_completed_total", "Total number of verification tasks completed");
    describe_counter!("verification_tasks_dead_lettered_total", "Total number of verification tasks dead-lettered");
    describe_counter!("jobs_purged_total", "Total number of jobs deleted by the retention sweep");
    describe_histogram!("scrape_run_duration_seconds", "Duration of full scrape runs in seconds");
    describe_histogram!("verification_duration_seconds", "Duration of single verification attempts in seconds");
}

fn update_system_metrics() {
    if let Ok(mut sys) = SYSTEM.lock() {
        sys.refresh_cpu_all();
        sys.refresh_memory();

        let cpu_usage = sys.global_cpu_usage() / 100.0;
        gauge!("system_cpu_usage_ratio").set(cpu_usage as f64);

        let total_mem = sys.total_memory();
        if total_mem > 0 {
            let mem_usage = sys.used_memory() as f64 / total_mem as f64;
            gauge!("system_memory_usage_ratio").set(mem_usage);
        }
    }
}

/// 获取当前系统 CPU 使用率 (0.0 - 1.0)
pub fn get_cpu_usage() -> f64 {
    if let Ok(mut sys) = SYSTEM.lock() {
        sys.refresh_cpu_all();
        (sys.global_cpu_usage() / 100.0) as f64
    } else {
        0.0
    }
}

/// 获取当前系统内存使用率 (0.0 - 1.0)
pub fn get_memory_usage() -> f64 {
    if let Ok(mut sys) = SYSTEM.lock() {
        sys.refresh_memory();
        let total_mem = sys.total_memory();
        if total_mem > 0 {
            sys.used_memory() as f64 / total_mem as f64
        } else {
            0.0
        }
    } else {
        0.0
    }
}

/// 资源守卫：CPU 与内存都低于阈值才放行抓取
///
/// # 参数
///
/// * `max_cpu_percent` - CPU 使用率上限（百分比）
/// * `max_memory_percent` - 内存使用率上限（百分比）
pub fn resources_are_free(max_cpu_percent: f32, max_memory_percent: f32) -> bool {
    let cpu = get_cpu_usage() * 100.0;
    let mem = get_memory_usage() * 100.0;
    let free = cpu < max_cpu_percent as f64 && mem < max_memory_percent as f64;
    if !free {
        warn!(
            cpu_percent = cpu,
            memory_percent = mem,
            "Resource guard tripped, postponing work"
        );
    }
    free
}
