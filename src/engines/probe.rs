// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::sites::SourceSite;
use crate::utils::retry_policy::{with_retries, RetryPolicy};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// 探测错误类型
#[derive(Error, Debug)]
pub enum ProbeError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

impl ProbeError {
    /// 超时、连接失败与 5xx 值得换次请求重试
    pub fn is_transient(&self) -> bool {
        match self {
            ProbeError::RequestFailed(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().map_or(false, |s| s.is_server_error())
            }
        }
    }
}

/// 结果总数探测器
///
/// 抓取前用普通 HTTP 请求拉取第一页，从响应文本里解析
/// 站点标注的结果总数，推算分页数。探测失败不是致命错误，
/// 调用方降级为单页抓取。
pub struct PageCountProbe {
    client: reqwest::Client,
    retry_policy: RetryPolicy,
}

impl PageCountProbe {
    /// 创建新的探测器
    pub fn new(timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .user_agent(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
            )
            .timeout(timeout)
            .gzip(true)
            .build()?;
        // Short backoff, the caller degrades to a single page on failure
        let retry_policy = RetryPolicy {
            max_retries: 2,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(5),
            ..RetryPolicy::standard()
        };
        Ok(Self {
            client,
            retry_policy,
        })
    }

    /// 探测查询的总页数
    ///
    /// # 参数
    ///
    /// * `site` - 目标站点定义，负责从响应文本解析结果总数
    /// * `url` - 第一页的列表URL
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(pages))` - 解析成功的总页数（至少 1）
    /// * `Ok(None)` - 响应中找不到结果总数
    /// * `Err(ProbeError)` - 请求失败
    pub async fn probe_total_pages(
        &self,
        site: &dyn SourceSite,
        url: &str,
    ) -> Result<Option<u32>, ProbeError> {
        let body = with_retries(
            &self.retry_policy,
            "page_count_probe",
            ProbeError::is_transient,
            || {
                let request = self.client.get(url);
                async move {
                    let response = request.send().await?.error_for_status()?;
                    Ok::<_, ProbeError>(response.text().await?)
                }
            },
        )
        .await?;

        match site.parse_result_count(&body) {
            Some(total) => {
                let per_page = site.results_per_page().max(1) as u64;
                let pages = total.div_ceil(per_page).max(1).min(u32::MAX as u64) as u32;
                debug!(site = site.name(), url, total, pages, "Probed result count");
                Ok(Some(pages))
            }
            None => {
                warn!(site = site.name(), url, "Result count not found in probe response");
                Ok(None)
            }
        }
    }
}
